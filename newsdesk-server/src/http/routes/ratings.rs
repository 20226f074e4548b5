//! Rating and recommendation endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::extractors::{CurrentUser, JsonBody, ValidNewsId};
use crate::http::server::AppState;
use crate::models::{News, RatingValue};
use crate::recommend::recommend;

/// Rate article request
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    /// Any JSON value; validated into `1..=5`
    #[serde(default)]
    pub rating: serde_json::Value,
}

/// Rate article response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    pub message: &'static str,
    pub num_reviews: i64,
    pub average_rating: f64,
}

/// POST /news/{id}/rate - rate an article once per user
async fn rate_news(
    State(state): State<Arc<AppState>>,
    ValidNewsId(id): ValidNewsId,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<RateRequest>,
) -> Result<(StatusCode, Json<RateResponse>), ApiError> {
    let rating = RatingValue::from_json(&req.rating)?;
    let summary = state.store.rate(id, user, rating).await?;

    tracing::info!(
        %id,
        %user,
        rating = rating.get(),
        num_reviews = summary.num_reviews,
        "rating added"
    );

    Ok((
        StatusCode::CREATED,
        Json(RateResponse {
            message: "Rating added successfully",
            num_reviews: summary.num_reviews,
            average_rating: summary.average_rating,
        }),
    ))
}

/// GET /news/recommended - articles liked by users with similar taste
async fn recommended_news(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<News>>, ApiError> {
    let recs = recommend(state.store.as_ref(), user).await.map_err(|e| {
        ApiError::from(e).server_message("Server Error while fetching recommendations")
    })?;
    Ok(Json(recs.news))
}

/// Rating routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/news/{id}/rate", post(rate_news))
        .route("/news/recommended", get(recommended_news))
}
