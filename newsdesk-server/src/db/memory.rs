//! In-memory news store
//!
//! Same contract as the Postgres repository. Backs the router tests and
//! `newsdesk serve --in-memory`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{DbError, NewsStore, SimilarUser};
use crate::models::{
    NewNews, News, NewsId, NewsPatch, Rating, RatingSummary, RatingValue, UserId,
};

/// Articles kept in insertion order
#[derive(Default)]
pub struct MemoryNewsStore {
    news: RwLock<Vec<News>>,
}

impl MemoryNewsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first; insertion order breaks timestamp ties.
fn newest_first(news: &[News]) -> Vec<News> {
    news.iter().rev().cloned().collect()
}

fn by_average_desc(a: &News, b: &News) -> Ordering {
    b.average_rating
        .partial_cmp(&a.average_rating)
        .unwrap_or(Ordering::Equal)
}

#[async_trait]
impl NewsStore for MemoryNewsStore {
    async fn list(&self, category: Option<&str>) -> Result<Vec<News>, DbError> {
        let news = self.news.read().await;
        Ok(newest_first(&news)
            .into_iter()
            .filter(|n| category.map_or(true, |c| n.category == c))
            .collect())
    }

    async fn get(&self, id: NewsId) -> Result<News, DbError> {
        let news = self.news.read().await;
        news.iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| DbError::news_not_found(id))
    }

    async fn create(&self, input: NewNews) -> Result<News, DbError> {
        let now = Utc::now();
        let created = News {
            id: NewsId::new_v4(),
            title: input.title,
            description: input.description,
            category: input.category,
            source: input.source,
            ratings: Vec::new(),
            num_reviews: 0,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        };

        self.news.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: NewsId, patch: NewsPatch) -> Result<News, DbError> {
        let mut news = self.news.write().await;
        let article = news
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DbError::news_not_found(id))?;

        patch.apply_to(article);
        article.updated_at = Utc::now();
        Ok(article.clone())
    }

    async fn delete(&self, id: NewsId) -> Result<(), DbError> {
        let mut news = self.news.write().await;
        let before = news.len();
        news.retain(|n| n.id != id);

        if news.len() == before {
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
        let mut news = self.news.write().await;
        let article = news
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DbError::news_not_found(id))?;

        if article.ratings.iter().any(|r| r.user == user) {
            return Err(DbError::AlreadyRated { news: id, user });
        }

        let now = Utc::now();
        article.ratings.push(Rating {
            user,
            rating: rating.get(),
            created_at: now,
        });

        let summary = RatingSummary::from_ratings(&article.ratings);
        article.num_reviews = summary.num_reviews;
        article.average_rating = summary.average_rating;
        article.updated_at = now;
        Ok(summary)
    }

    async fn rated_by(&self, user: UserId, min_rating: u8) -> Result<Vec<NewsId>, DbError> {
        let news = self.news.read().await;
        Ok(news
            .iter()
            .filter(|n| {
                n.ratings
                    .iter()
                    .any(|r| r.user == user && r.rating >= min_rating)
            })
            .map(|n| n.id)
            .collect())
    }

    async fn similar_users(
        &self,
        articles: &[NewsId],
        exclude: UserId,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<SimilarUser>, DbError> {
        let wanted: HashSet<NewsId> = articles.iter().copied().collect();
        let news = self.news.read().await;

        let mut shared: HashMap<UserId, i64> = HashMap::new();
        for rating in news
            .iter()
            .filter(|n| wanted.contains(&n.id))
            .flat_map(|n| n.ratings.iter())
            .filter(|r| r.rating >= min_rating && r.user != exclude)
        {
            *shared.entry(rating.user).or_default() += 1;
        }

        let mut users: Vec<SimilarUser> = shared
            .into_iter()
            .map(|(user, shared_likes)| SimilarUser { user, shared_likes })
            .collect();
        users.sort_by(|a, b| {
            b.shared_likes
                .cmp(&a.shared_likes)
                .then_with(|| a.user.cmp(&b.user))
        });
        users.truncate(limit);
        Ok(users)
    }

    async fn liked_by(
        &self,
        users: &[UserId],
        exclude: UserId,
        min_rating: u8,
        limit: usize,
    ) -> Result<Vec<News>, DbError> {
        let users: HashSet<UserId> = users.iter().copied().collect();
        let news = self.news.read().await;

        let mut liked: Vec<News> = newest_first(&news)
            .into_iter()
            .filter(|n| {
                n.ratings
                    .iter()
                    .any(|r| users.contains(&r.user) && r.rating >= min_rating)
            })
            .filter(|n| n.ratings.iter().all(|r| r.user != exclude))
            .collect();
        liked.sort_by(by_average_desc);
        liked.truncate(limit);
        Ok(liked)
    }

    async fn top_rated(&self, limit: usize) -> Result<Vec<News>, DbError> {
        let news = self.news.read().await;
        let mut top = newest_first(&news);
        top.sort_by(by_average_desc);
        top.truncate(limit);
        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> UserId {
        UserId(Uuid::new_v4())
    }

    fn stars(v: i64) -> RatingValue {
        RatingValue::new(v).unwrap()
    }

    async fn seed(store: &MemoryNewsStore, title: &str, category: &str) -> News {
        store
            .create(NewNews::new(title, "Body", category, None).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_returns_stored_entity() {
        let store = MemoryNewsStore::new();
        let created = seed(&store, "First", "tech").await;

        assert_eq!(created.num_reviews, 0);
        assert_eq!(created.average_rating, 0.0);
        assert_eq!(store.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn list_filters_by_category_newest_first() {
        let store = MemoryNewsStore::new();
        seed(&store, "a", "tech").await;
        seed(&store, "b", "sports").await;
        seed(&store, "c", "tech").await;

        let all = store.list(None).await.unwrap();
        assert_eq!(
            all.iter().map(|n| n.title.as_str()).collect::<Vec<_>>(),
            ["c", "b", "a"]
        );

        let tech = store.list(Some("tech")).await.unwrap();
        assert_eq!(
            tech.iter().map(|n| n.title.as_str()).collect::<Vec<_>>(),
            ["c", "a"]
        );

        assert!(store.list(Some("weather")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_missing_are_not_found() {
        let store = MemoryNewsStore::new();
        let missing = NewsId::new_v4();

        let err = store.update(missing, NewsPatch::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "news", .. }));

        let err = store.delete(missing).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_keeps_ratings() {
        let store = MemoryNewsStore::new();
        let news = seed(&store, "a", "tech").await;
        store.rate(news.id, user(), stars(4)).await.unwrap();

        let patch = NewsPatch::new(Some("renamed"), None, None, None).unwrap();
        let updated = store.update(news.id, patch).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.num_reviews, 1);
        assert_eq!(updated.ratings.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_article() {
        let store = MemoryNewsStore::new();
        let news = seed(&store, "a", "tech").await;
        store.delete(news.id).await.unwrap();
        assert!(store.get(news.id).await.is_err());
        assert!(store.delete(news.id).await.is_err());
    }

    #[tokio::test]
    async fn rating_twice_is_rejected() {
        let store = MemoryNewsStore::new();
        let news = seed(&store, "a", "tech").await;
        let reader = user();

        store.rate(news.id, reader, stars(5)).await.unwrap();
        let err = store.rate(news.id, reader, stars(1)).await.unwrap_err();
        assert!(matches!(err, DbError::AlreadyRated { .. }));

        let stored = store.get(news.id).await.unwrap();
        assert_eq!(stored.num_reviews, 1);
        assert_eq!(stored.average_rating, 5.0);
    }

    #[tokio::test]
    async fn average_recomputes_after_each_rating() {
        let store = MemoryNewsStore::new();
        let news = seed(&store, "a", "tech").await;

        let s = store.rate(news.id, user(), stars(5)).await.unwrap();
        assert_eq!((s.num_reviews, s.average_rating), (1, 5.0));

        let s = store.rate(news.id, user(), stars(3)).await.unwrap();
        assert_eq!((s.num_reviews, s.average_rating), (2, 4.0));

        let s = store.rate(news.id, user(), stars(1)).await.unwrap();
        assert_eq!((s.num_reviews, s.average_rating), (3, 3.0));

        let stored = store.get(news.id).await.unwrap();
        assert_eq!(stored.summary(), s);
    }

    #[tokio::test]
    async fn rating_missing_article_is_not_found() {
        let store = MemoryNewsStore::new();
        let err = store
            .rate(NewsId::new_v4(), user(), stars(3))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn similar_users_ranked_by_shared_likes() {
        let store = MemoryNewsStore::new();
        let me = user();
        let twin = user();
        let casual = user();
        let a = seed(&store, "a", "tech").await;
        let b = seed(&store, "b", "tech").await;

        for id in [a.id, b.id] {
            store.rate(id, me, stars(5)).await.unwrap();
            store.rate(id, twin, stars(4)).await.unwrap();
        }
        store.rate(a.id, casual, stars(4)).await.unwrap();

        let similar = store
            .similar_users(&[a.id, b.id], me, 4, 10)
            .await
            .unwrap();
        assert_eq!(
            similar,
            vec![
                SimilarUser { user: twin, shared_likes: 2 },
                SimilarUser { user: casual, shared_likes: 1 },
            ]
        );

        let limited = store.similar_users(&[a.id, b.id], me, 4, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn low_ratings_do_not_count_as_likes() {
        let store = MemoryNewsStore::new();
        let me = user();
        let other = user();
        let a = seed(&store, "a", "tech").await;
        store.rate(a.id, me, stars(5)).await.unwrap();
        store.rate(a.id, other, stars(3)).await.unwrap();

        assert!(store.similar_users(&[a.id], me, 4, 10).await.unwrap().is_empty());
        assert!(store.rated_by(other, 4).await.unwrap().is_empty());
        assert_eq!(store.rated_by(me, 4).await.unwrap(), vec![a.id]);
    }

    #[tokio::test]
    async fn top_rated_orders_by_average() {
        let store = MemoryNewsStore::new();
        let low = seed(&store, "low", "tech").await;
        let high = seed(&store, "high", "tech").await;
        let _unrated = seed(&store, "unrated", "tech").await;
        store.rate(low.id, user(), stars(2)).await.unwrap();
        store.rate(high.id, user(), stars(5)).await.unwrap();

        let top = store.top_rated(2).await.unwrap();
        assert_eq!(
            top.iter().map(|n| n.title.as_str()).collect::<Vec<_>>(),
            ["high", "low"]
        );
    }
}
