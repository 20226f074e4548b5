//! Schema migrations for the news tables
//!
//! Every statement is idempotent, so running on each startup is safe.

use sqlx::PgPool;

use super::DbError;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "news",
        r#"
        CREATE TABLE IF NOT EXISTS news (
            id UUID PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            source TEXT,
            num_reviews BIGINT NOT NULL DEFAULT 0,
            average_rating DOUBLE PRECISION NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "news_ratings",
        r#"
        CREATE TABLE IF NOT EXISTS news_ratings (
            news_id UUID NOT NULL REFERENCES news(id) ON DELETE CASCADE,
            user_id UUID NOT NULL,
            rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (news_id, user_id)
        )
        "#,
    ),
    (
        "idx_news_category",
        "CREATE INDEX IF NOT EXISTS idx_news_category ON news(category)",
    ),
    (
        "idx_news_average_rating",
        "CREATE INDEX IF NOT EXISTS idx_news_average_rating ON news(average_rating DESC, created_at DESC)",
    ),
    (
        "idx_news_ratings_user",
        "CREATE INDEX IF NOT EXISTS idx_news_ratings_user ON news_ratings(user_id, rating)",
    ),
];

/// Run all migrations
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running news migrations...");

    for (name, sql) in STATEMENTS {
        sqlx::query(sql)
            .execute(pool)
            .await
            .map_err(|e| DbError::Migration(format!("{}: {}", name, e)))?;
        tracing::debug!(migration = *name, "applied");
    }

    tracing::info!("News migrations complete");
    Ok(())
}
