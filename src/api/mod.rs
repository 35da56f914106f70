//! REST API under `/api`.
//!
//! # Responsibilities
//! - Route table for self-reports, server lifecycle, templates, apply and
//!   audit log paging
//! - Action-level audit events for every mutating handler
//!
//! # Design Decisions
//! - Handlers return [`ApiResult`]; status mapping lives with `ApiError`
//! - Extractor rejections are converted to JSON 400s so every error body
//!   has the same shape
//! - Admission, request IDs and request-level audit are layered on by
//!   `http::server`, not here

pub mod audit;
pub mod configs;
pub mod health;
pub mod servers;

use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditEvent, AuditSink, Outcome};
use crate::error::{ApiError, ApiResult};
use crate::http::request::RequestInfo;
use crate::http::server::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/report", post(servers::report))
        .route("/servers", get(servers::list_servers))
        .route("/servers/{serial}", get(servers::get_server))
        .route("/servers/{serial}/confirm", post(servers::confirm_server))
        .route("/servers/{serial}/install", post(servers::mark_installed))
        .route("/configs", get(configs::list_configs).post(configs::create_config))
        .route("/configs/{id}", get(configs::get_config).put(configs::update_config))
        .route("/configs/{id}/apply", post(configs::apply_config))
        .route("/audit/logs", get(audit::list_audit_logs))
        .with_state(state)
}

/// `{"status": ..., "message": ...}` acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            message: message.into(),
        }
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self {
            status: "duplicate".into(),
            message: message.into(),
        }
    }
}

/// Record the outcome of a mutating action.
pub(crate) fn record_action<T>(
    sink: &AuditSink,
    info: &RequestInfo,
    action: &str,
    target: &str,
    result: &ApiResult<T>,
) {
    match result {
        Ok(_) => sink.record(AuditEvent::new(action, target, Outcome::Success).with_request(info)),
        Err(e) => record_failure(sink, info, action, target, e),
    }
}

pub(crate) fn record_failure(sink: &AuditSink, info: &RequestInfo, action: &str, target: &str, error: &ApiError) {
    sink.record(
        AuditEvent::new(action, target, Outcome::Failure)
            .with_request(info)
            .with_error(error),
    );
}

/// Parse a numeric path id, rejecting anything else as a 400.
pub(crate) fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::Validation(format!("invalid id '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("-1").is_err());
        assert!(parse_id("abc").is_err());
    }
}
