//! Postgres news repository
//!
//! - create/update: CTE + ratings subquery, one round trip
//! - rate: row lock + ON CONFLICT insert + aggregate refresh in one transaction
//! - list: ratings folded into a JSON column (no N+1)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::{DbError, NewsStore, SimilarUser};
use crate::models::{
    NewNews, News, NewsId, NewsPatch, Rating, RatingSummary, RatingValue, UserId,
};

/// Article row with its ratings aggregated as JSON
#[derive(Debug, FromRow)]
struct NewsRow {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    source: Option<String>,
    num_reviews: i64,
    average_rating: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    ratings: Json<Vec<Rating>>,
}

impl From<NewsRow> for News {
    fn from(r: NewsRow) -> Self {
        Self {
            id: NewsId(r.id),
            title: r.title,
            description: r.description,
            category: r.category,
            source: r.source,
            ratings: r.ratings.0,
            num_reviews: r.num_reviews,
            average_rating: r.average_rating,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Build the article projection over `source`, which must be aliased `n`.
fn select_news(source: &str) -> String {
    format!(
        r#"
        SELECT
            n.id, n.title, n.description, n.category, n.source,
            n.num_reviews, n.average_rating, n.created_at, n.updated_at,
            COALESCE(
                (SELECT json_agg(
                            json_build_object(
                                'user', r.user_id,
                                'rating', r.rating,
                                'createdAt', r.created_at
                            )
                            ORDER BY r.created_at, r.user_id
                        )
                 FROM news_ratings r
                 WHERE r.news_id = n.id),
                '[]'::json
            ) AS ratings
        FROM {source}
        "#
    )
}

fn to_uuids<T, F: Fn(&T) -> Uuid>(items: &[T], f: F) -> Vec<Uuid> {
    items.iter().map(f).collect()
}

/// News repository backed by Postgres
#[derive(Clone)]
pub struct PgNewsStore {
    pool: PgPool,
}

impl PgNewsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl NewsStore for PgNewsStore {
    async fn list(&self, category: Option<&str>) -> Result<Vec<News>, DbError> {
        let sql = format!(
            "{} WHERE ($1::text IS NULL OR n.category = $1) ORDER BY n.created_at DESC, n.id",
            select_news("news n")
        );
        let rows: Vec<NewsRow> = sqlx::query_as(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(News::from).collect())
    }

    async fn get(&self, id: NewsId) -> Result<News, DbError> {
        let sql = format!("{} WHERE n.id = $1", select_news("news n"));
        let row: NewsRow = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::news_not_found(id))?;

        Ok(row.into())
    }

    async fn create(&self, news: NewNews) -> Result<News, DbError> {
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO news (id, title, description, category, source)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            {}
            "#,
            select_news("inserted n")
        );

        let row: NewsRow = sqlx::query_as(&sql)
            .bind(NewsId::new_v4().as_uuid())
            .bind(&news.title)
            .bind(&news.description)
            .bind(&news.category)
            .bind(news.source.as_deref())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn update(&self, id: NewsId, patch: NewsPatch) -> Result<News, DbError> {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE news SET
                    title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    category = COALESCE($4, category),
                    source = CASE WHEN $5 THEN $6 ELSE source END,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            {}
            "#,
            select_news("updated n")
        );

        let (clear_or_set_source, source) = match patch.source {
            Some(source) => (true, source),
            None => (false, None),
        };

        let row: NewsRow = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.category)
            .bind(clear_or_set_source)
            .bind(source)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::news_not_found(id))?;

        Ok(row.into())
    }

    async fn delete(&self, id: NewsId) -> Result<(), DbError> {
        // news_ratings rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::news_not_found(id));
        }
        Ok(())
    }

    async fn rate(
        &self,
        id: NewsId,
        user: UserId,
        rating: RatingValue,
    ) -> Result<RatingSummary, DbError> {
        let mut tx = self.pool.begin().await?;

        // Lock the article so concurrent ratings serialize on the aggregate
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM news WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        if exists.is_none() {
            return Err(DbError::news_not_found(id));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO news_ratings (news_id, user_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (news_id, user_id) DO NOTHING
            "#,
        )
        .bind(id.as_uuid())
        .bind(user.as_uuid())
        .bind(rating.get() as i16)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(DbError::AlreadyRated { news: id, user });
        }

        let (num_reviews, average_rating): (i64, f64) = sqlx::query_as(
            r#"
            UPDATE news SET
                num_reviews = agg.num_reviews,
                average_rating = agg.average_rating,
                updated_at = NOW()
            FROM (
                SELECT COUNT(*) AS num_reviews,
                       COALESCE(AVG(rating), 0)::float8 AS average_rating
                FROM news_ratings
                WHERE news_id = $1
            ) agg
            WHERE news.id = $1
            RETURNING news.num_reviews, news.average_rating
            "#,
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RatingSummary {
            num_reviews,
            average_rating,
        })
    }

    async fn rated_by(&self, user: UserId, min_rating: u8) -> Result<Vec<NewsId>, DbError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT news_id FROM news_ratings
            WHERE user_id = $1 AND rating >= $2
            ORDER BY created_at, news_id
            "#,
        )
        .bind(user.as_uuid())
        .bind(min_rating as i16)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| NewsId(id)).collect())
    }

    async fn similar_users(
        &self,
        articles: &[NewsId],
        exclude: UserId,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<SimilarUser>, DbError> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT user_id, COUNT(*) AS shared_likes
            FROM news_ratings
            WHERE news_id = ANY($1) AND rating >= $2 AND user_id <> $3
            GROUP BY user_id
            ORDER BY shared_likes DESC, user_id
            LIMIT $4
            "#,
        )
        .bind(to_uuids(articles, NewsId::as_uuid))
        .bind(min_rating as i16)
        .bind(exclude.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user, shared_likes)| SimilarUser {
                user: UserId(user),
                shared_likes,
            })
            .collect())
    }

    async fn liked_by(
        &self,
        users: &[UserId],
        exclude: UserId,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<News>, DbError> {
        let sql = format!(
            r#"
            {}
            WHERE EXISTS (
                SELECT 1 FROM news_ratings liked
                WHERE liked.news_id = n.id
                  AND liked.user_id = ANY($1)
                  AND liked.rating >= $2
            )
            AND NOT EXISTS (
                SELECT 1 FROM news_ratings seen
                WHERE seen.news_id = n.id AND seen.user_id = $3
            )
            ORDER BY n.average_rating DESC, n.created_at DESC
            LIMIT $4
            "#,
            select_news("news n")
        );

        let rows: Vec<NewsRow> = sqlx::query_as(&sql)
            .bind(to_uuids(users, UserId::as_uuid))
            .bind(min_rating as i16)
            .bind(exclude.as_uuid())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(News::from).collect())
    }

    async fn top_rated(&self, limit: usize) -> Result<Vec<News>, DbError> {
        let sql = format!(
            "{} ORDER BY n.average_rating DESC, n.created_at DESC LIMIT $1",
            select_news("news n")
        );
        let rows: Vec<NewsRow> = sqlx::query_as(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(News::from).collect())
    }
}
