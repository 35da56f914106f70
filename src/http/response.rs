//! Response mapping.
//!
//! # Responsibilities
//! - Map [`ApiError`] to status codes and JSON bodies
//! - Attach rate limit guidance to 429 responses
//!
//! # Design Decisions
//! - Error bodies are always `{"error": "..."}`
//! - 5xx details go to the log, the client sees a generic message

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::ApiError;

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_WINDOW: &str = "x-ratelimit-window";

/// Rate limit window, in seconds.
const RATE_WINDOW_SECS: u32 = 60;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Storage(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message safe to show the caller.
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        match self {
            ApiError::RateLimited { limit } => {
                let body = json!({
                    "error": "rate limit exceeded",
                    "limit": limit,
                    "windowSeconds": RATE_WINDOW_SECS,
                });
                let mut response = (status, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
                headers.insert(X_RATELIMIT_WINDOW, HeaderValue::from(RATE_WINDOW_SECS));
                headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs(limit)));
                response
            }
            other => (status, Json(json!({ "error": other.public_message() }))).into_response(),
        }
    }
}

/// Seconds until one token refills at `limit` per minute.
fn retry_after_secs(limit: u32) -> u32 {
    if limit == 0 {
        return RATE_WINDOW_SECS;
    }
    RATE_WINDOW_SECS.div_ceil(limit).max(1)
}
