//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Every body has the shape `{"error": "<kind>", "message": "<text>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Request rejected with a caller-facing message (400)
    BadRequest { message: String },

    /// No authenticated user on the request (401)
    Unauthorized,

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Request took longer than the configured timeout (408)
    Timeout { seconds: u64 },

    /// Database error (500, logged); `message` is what the caller sees
    Database { error: DbError, message: &'static str },

    /// Internal error (500)
    Internal { message: String },
}

impl ApiError {
    /// Validation failure with a handler-specific prefix.
    pub fn invalid(context: &str, e: ValidationError) -> Self {
        Self::BadRequest {
            message: format!("{}: {}", context, e),
        }
    }

    /// Replace the caller-facing text of a 500. Other errors pass through.
    pub fn server_message(self, message: &'static str) -> Self {
        match self {
            Self::Database { error, .. } => Self::Database { error, message },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Caller-facing text for 500s
const SERVER_ERROR: &str = "Server Error";

fn not_found_message(resource: &str) -> String {
    match resource {
        "news" => "News article not found".to_owned(),
        other => format!("{} not found", other),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(e) => json!({
                "error": "validation_error",
                "message": e.to_string()
            }),
            Self::BadRequest { message } => json!({
                "error": "bad_request",
                "message": message
            }),
            Self::Unauthorized => json!({
                "error": "unauthorized",
                "message": "Not authorized"
            }),
            Self::NotFound { resource, id } => {
                tracing::debug!(resource, id = %id, "not found");
                json!({
                    "error": "not_found",
                    "message": not_found_message(resource)
                })
            }
            Self::Timeout { seconds } => json!({
                "error": "timeout",
                "message": format!("request timed out after {} seconds", seconds)
            }),
            Self::Database { error, message } => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", error);
                json!({
                    "error": "internal_error",
                    "message": message
                })
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                json!({
                    "error": "internal_error",
                    "message": SERVER_ERROR
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::AlreadyRated { .. } => Self::BadRequest {
                message: "You have already rated this article.".to_owned(),
            },
            _ => Self::Database {
                error: e,
                message: SERVER_ERROR,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use crate::models::{NewsId, UserId};
    use uuid::Uuid;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "title" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = body_json(DbError::news_not_found(NewsId::new_v4()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "News article not found");
    }

    #[tokio::test]
    async fn already_rated_is_400() {
        let err: ApiError = DbError::AlreadyRated {
            news: NewsId::new_v4(),
            user: UserId(Uuid::new_v4()),
        }
        .into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "You have already rated this article.");
    }

    #[tokio::test]
    async fn database_error_hides_details() {
        let err: ApiError = DbError::Sqlx(sqlx::Error::PoolTimedOut).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "Server Error");
    }

    #[tokio::test]
    async fn server_message_overrides_500_text() {
        let err = ApiError::from(DbError::Sqlx(sqlx::Error::PoolTimedOut))
            .server_message("Server Error while fetching recommendations");
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server Error while fetching recommendations");
    }

    #[tokio::test]
    async fn server_message_leaves_client_errors_alone() {
        let err = ApiError::from(DbError::news_not_found(NewsId::new_v4()))
            .server_message("Server Error while fetching recommendations");
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "News article not found");
    }

    #[tokio::test]
    async fn timeout_is_408_json() {
        let (status, body) = body_json(ApiError::Timeout { seconds: 30 }).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"], "timeout");
        assert_eq!(body["message"], "request timed out after 30 seconds");
    }

    #[tokio::test]
    async fn unauthorized_is_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn invalid_prefixes_context() {
        let err = ApiError::invalid("Error creating news", ValidationError::Empty { field: "title" });
        match err {
            ApiError::BadRequest { message } => {
                assert_eq!(message, "Error creating news: title cannot be empty")
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
