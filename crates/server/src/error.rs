// ABOUTME: Error-to-HTTP response conversion for feed handlers.
// ABOUTME: Fetch failures map to 502, source failures to 500, bad cursors to 400.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reelfeed_feed::{FeedError, FeedSourceError};
use serde_json::json;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch feed, please try again later";

/// Wrapper so handlers can return `Result<T, AppError>`.
#[derive(Debug)]
pub struct AppError(pub FeedError);

impl From<FeedError> for AppError {
    fn from(e: FeedError) -> Self {
        Self(e)
    }
}

impl From<FeedSourceError> for AppError {
    fn from(e: FeedSourceError) -> Self {
        Self(FeedError::Source(e))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            FeedError::Fetch(_) => StatusCode::BAD_GATEWAY,
            FeedError::Source(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FeedError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self.0 {
            FeedError::Fetch(err) => {
                tracing::warn!(upstream_status = ?err.status, error = %err, "feed fetch failed");
                json!({
                    "error": "feed_fetch_failed",
                    "message": FETCH_FAILED_MESSAGE,
                    "status": err.status,
                    "details": err.to_string(),
                })
            }
            FeedError::Source(err) => {
                tracing::error!(error = %err, "feed source unavailable");
                json!({
                    "error": "feed_source_unavailable",
                    "message": err.to_string(),
                })
            }
            FeedError::InvalidCursor(cursor) => json!({
                "error": "invalid_cursor",
                "message": format!("cursor {cursor:?} is not a valid page offset"),
            }),
        };

        (status, Json(body)).into_response()
    }
}
