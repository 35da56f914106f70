//! Per-request context.
//!
//! # Responsibilities
//! - Name the request ID header
//! - Collect the request facts audit events carry (client, user agent,
//!   method, path, request ID)
//!
//! # Design Decisions
//! - Request ID is assigned by `SetRequestIdLayer` before any handler runs
//! - Client address comes from the `ClientAddress` extension resolved by
//!   the outermost middleware, never from raw headers here

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::{header::USER_AGENT, request::Parts, HeaderMap};

use crate::security::client_addr::ClientAddress;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request facts for audit records. Never fails to extract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    pub client_ip: String,
    pub user_agent: String,
    pub method: String,
    pub path: String,
    pub request_id: Option<String>,
}

impl RequestInfo {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            client_ip: parts
                .extensions
                .get::<ClientAddress>()
                .map(|addr| addr.to_string())
                .unwrap_or_default(),
            user_agent: header_str(&parts.headers, USER_AGENT.as_str()).unwrap_or_default(),
            method: parts.method.to_string(),
            // Nested routers see a stripped URI; audit the one the client sent.
            path: parts
                .extensions
                .get::<OriginalUri>()
                .map(|uri| uri.0.path().to_string())
                .unwrap_or_else(|| parts.uri.path().to_string()),
            request_id: request_id(&parts.headers),
        }
    }
}

impl<S> FromRequestParts<S> for RequestInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

pub fn request_id(headers: &HeaderMap) -> Option<String> {
    header_str(headers, X_REQUEST_ID)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_from_parts() {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/report?x=1")
            .header("user-agent", "curl/8.0")
            .header(X_REQUEST_ID, "abc-123")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ClientAddress("10.1.2.3".parse().unwrap()));
        let (parts, _) = request.into_parts();

        let info = RequestInfo::from_parts(&parts);
        assert_eq!(info.client_ip, "10.1.2.3");
        assert_eq!(info.user_agent, "curl/8.0");
        assert_eq!(info.method, "POST");
        assert_eq!(info.path, "/api/report");
        assert_eq!(info.request_id.as_deref(), Some("abc-123"));
    }
}
