//! Database layer - connection pool, migrations and the news store
//!
//! # Design Principles
//!
//! - Handlers only see the [`NewsStore`] trait
//! - Ratings are fetched with the article in one query (no N+1)
//! - Rely on DB constraints for one-rating-per-user (no check-then-insert)
//! - Transactions for multi-step operations

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repos;

use async_trait::async_trait;

use crate::models::{NewNews, News, NewsId, NewsPatch, RatingSummary, RatingValue, UserId};

pub use memory::MemoryNewsStore;
pub use pool::{create_pool, create_pool_with_options};
pub use repos::PgNewsStore;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("user '{user}' already rated news '{news}'")]
    AlreadyRated { news: NewsId, user: UserId },
}

impl DbError {
    pub(crate) fn news_not_found(id: NewsId) -> Self {
        Self::NotFound {
            resource: "news",
            id: id.to_string(),
        }
    }
}

/// A user who liked some of the same articles, with the overlap size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimilarUser {
    pub user: UserId,
    pub shared_likes: i64,
}

/// Storage seam for news articles and their ratings.
#[async_trait]
pub trait NewsStore: Send + Sync + 'static {
    /// All articles, newest first, optionally restricted to one category.
    async fn list(&self, category: Option<&str>) -> Result<Vec<News>, DbError>;

    async fn get(&self, id: NewsId) -> Result<News, DbError>;

    async fn create(&self, news: NewNews) -> Result<News, DbError>;

    async fn update(&self, id: NewsId, patch: NewsPatch) -> Result<News, DbError>;

    async fn delete(&self, id: NewsId) -> Result<(), DbError>;

    /// Record a rating and recompute the article's aggregate atomically.
    ///
    /// Fails with [`DbError::AlreadyRated`] if `user` rated this article before.
    async fn rate(
        &self,
        id: NewsId,
        user: UserId,
        rating: RatingValue,
    ) -> Result<RatingSummary, DbError>;

    /// Ids of articles `user` rated at least `min_rating`.
    async fn rated_by(&self, user: UserId, min_rating: u8) -> Result<Vec<NewsId>, DbError>;

    /// Other users who rated any of `articles` at least `min_rating`,
    /// most shared likes first (ties by user id), at most `limit`.
    async fn similar_users(
        &self,
        articles: &[NewsId],
        exclude: UserId,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<SimilarUser>, DbError>;

    /// Articles some of `users` rated at least `min_rating` that `exclude`
    /// never rated, best average first, at most `limit`.
    async fn liked_by(
        &self,
        users: &[UserId],
        exclude: UserId,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<News>, DbError>;

    /// Highest average rating first, newest first on ties.
    async fn top_rated(&self, limit: usize) -> Result<Vec<News>, DbError>;
}
