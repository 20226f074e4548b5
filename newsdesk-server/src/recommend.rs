//! User-based collaborative filtering over article ratings
//!
//! Three store queries, no iteration:
//! 1. articles the user rated highly
//! 2. other users who also rated those highly ("taste twins")
//! 3. articles the twins rated highly that the user hasn't rated
//!
//! When step 1 or 2 comes back empty the top-rated articles are returned
//! instead.

use tracing::debug;

use crate::db::{DbError, NewsStore};
use crate::models::{News, UserId};

/// A rating at or above this counts as a like
pub const HIGH_RATING: u8 = 4;

/// Size of the top-rated fallback list
pub const FALLBACK_LIMIT: usize = 5;

/// How many taste twins to consider
pub const SIMILAR_USER_LIMIT: usize = 10;

/// Maximum number of recommendations
pub const RECOMMENDATION_LIMIT: usize = 5;

/// Which path produced a recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The user has no high ratings yet
    NoLikes,
    /// Nobody else liked what the user liked
    NoSimilarUsers,
    /// Articles liked by similar users
    SimilarUsers,
}

/// Recommendations plus the path that produced them.
#[derive(Debug, Clone)]
pub struct Recommendations {
    pub source: Source,
    pub news: Vec<News>,
}

/// Recommend articles for `user`.
pub async fn recommend(store: &dyn NewsStore, user: UserId) -> Result<Recommendations, DbError> {
    let liked = store.rated_by(user, HIGH_RATING).await?;
    if liked.is_empty() {
        debug!(%user, "no high ratings, falling back to top rated");
        return fallback(store, Source::NoLikes).await;
    }

    let twins = store
        .similar_users(&liked, user, HIGH_RATING, SIMILAR_USER_LIMIT)
        .await?;
    if twins.is_empty() {
        debug!(%user, liked = liked.len(), "no similar users, falling back to top rated");
        return fallback(store, Source::NoSimilarUsers).await;
    }

    let twin_ids: Vec<UserId> = twins.iter().map(|t| t.user).collect();
    let news = store
        .liked_by(&twin_ids, user, HIGH_RATING, RECOMMENDATION_LIMIT)
        .await?;

    debug!(
        %user,
        liked = liked.len(),
        twins = twin_ids.len(),
        recommended = news.len(),
        "collaborative recommendations"
    );

    Ok(Recommendations {
        source: Source::SimilarUsers,
        news,
    })
}

async fn fallback(store: &dyn NewsStore, source: Source) -> Result<Recommendations, DbError> {
    let news = store.top_rated(FALLBACK_LIMIT).await?;
    Ok(Recommendations { source, news })
}
