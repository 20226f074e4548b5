//! News article endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, QueryParams, ValidNewsId};
use crate::http::server::AppState;
use crate::models::{NewNews, News, NewsPatch};

/// Query parameters for listing
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

impl ListParams {
    /// Blank category means no filter.
    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Create news request
#[derive(Debug, Deserialize)]
pub struct CreateNewsRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub source: Option<String>,
}

/// Update news request; absent fields are left untouched.
///
/// Rating fields are not accepted here and are ignored if sent.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// `null` clears the source, absence keeps it
    #[serde(default, deserialize_with = "present_or_null")]
    pub source: Option<Option<String>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Plain message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /news - list articles, optionally by category
async fn list_news(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<News>>, ApiError> {
    let news = state.store.list(params.category()).await?;
    Ok(Json(news))
}

/// GET /news/{id} - get a single article
async fn get_news(
    State(state): State<Arc<AppState>>,
    ValidNewsId(id): ValidNewsId,
) -> Result<Json<News>, ApiError> {
    let news = state.store.get(id).await?;
    Ok(Json(news))
}

/// POST /news - create an article
async fn create_news(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateNewsRequest>,
) -> Result<(StatusCode, Json<News>), ApiError> {
    let input = NewNews::new(
        &req.title,
        &req.description,
        &req.category,
        req.source.as_deref(),
    )
    .map_err(|e| ApiError::invalid("Error creating news", e))?;

    let news = state.store.create(input).await?;
    tracing::info!(id = %news.id, category = %news.category, "news created");

    Ok((StatusCode::CREATED, Json(news)))
}

/// PUT /news/{id} - update an article
async fn update_news(
    State(state): State<Arc<AppState>>,
    ValidNewsId(id): ValidNewsId,
    JsonBody(req): JsonBody<UpdateNewsRequest>,
) -> Result<Json<News>, ApiError> {
    let patch = NewsPatch::new(
        req.title.as_deref(),
        req.description.as_deref(),
        req.category.as_deref(),
        req.source.as_ref().map(|s| s.as_deref()),
    )
    .map_err(|e| ApiError::invalid("Error updating news", e))?;

    let news = state.store.update(id, patch).await?;
    Ok(Json(news))
}

/// DELETE /news/{id} - delete an article and its ratings
async fn delete_news(
    State(state): State<Arc<AppState>>,
    ValidNewsId(id): ValidNewsId,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete(id).await?;
    tracing::info!(%id, "news deleted");

    Ok(Json(MessageResponse {
        message: "News deleted",
    }))
}

/// News routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/news", get(list_news).post(create_news))
        .route(
            "/news/{id}",
            get(get_news).put(update_news).delete(delete_news),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_category_is_no_filter() {
        let params = ListParams {
            category: Some("  ".into()),
        };
        assert_eq!(params.category(), None);

        let params = ListParams {
            category: Some("tech".into()),
        };
        assert_eq!(params.category(), Some("tech"));
    }

    #[test]
    fn update_request_distinguishes_null_source() {
        let req: UpdateNewsRequest = serde_json::from_str(r#"{"source": null}"#).unwrap();
        assert_eq!(req.source, Some(None));

        let req: UpdateNewsRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(req.source, None);

        let req: UpdateNewsRequest = serde_json::from_str(r#"{"source": "AP"}"#).unwrap();
        assert_eq!(req.source, Some(Some("AP".into())));
    }

    #[test]
    fn update_request_ignores_rating_fields() {
        let req: UpdateNewsRequest =
            serde_json::from_str(r#"{"averageRating": 5, "numReviews": 100}"#).unwrap();
        assert!(req.title.is_none());
        assert!(req.source.is_none());
    }
}
