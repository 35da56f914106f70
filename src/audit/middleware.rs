//! Request-level audit middleware.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::audit::event::{AuditEvent, Outcome};
use crate::audit::sink::AuditSink;
use crate::http::request::RequestInfo;

pub const HTTP_REQUEST_ACTION: &str = "http_request";

/// Record one `http_request` event per request after the response is built.
/// Rejections by inner layers (401, 429) are recorded as failures too.
pub async fn audit_request_middleware(
    State(sink): State<Arc<AuditSink>>,
    info: RequestInfo,
    request: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let status = response.status();
    let outcome = if status.is_client_error() || status.is_server_error() {
        Outcome::Failure
    } else {
        Outcome::Success
    };

    let mut event = AuditEvent::new(HTTP_REQUEST_ACTION, info.path.clone(), outcome)
        .with_request(&info)
        .with_metadata("status", status.as_u16());
    if let Some(id) = &info.request_id {
        event = event.with_metadata("requestId", id.as_str());
    }
    sink.record(event);

    response
}
