//! Admission chain: whitelist bypass, then bearer auth, then rate limit.
//!
//! Whitelisted clients skip BOTH authentication and rate limiting. This is
//! an operational override for trusted internal ranges (the install network
//! the servers report from), not an oversight. Keep the whitelist narrow.

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::observability::metrics;
use crate::security::auth::{AuthError, TokenAuthenticator};
use crate::security::client_addr::ClientAddress;
use crate::security::rate_limit::RateLimiter;
use crate::security::whitelist::Whitelist;

/// Outcome of a successful admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Client is whitelisted; no auth or rate limit applied.
    Bypassed,
    /// Client presented a valid token and had budget left.
    Admitted,
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unauthorized(AuthError),
    RateLimited { limit: u32 },
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unauthorized(e) => ApiError::Unauthorized(e),
            Rejection::RateLimited { limit } => ApiError::RateLimited { limit },
        }
    }
}

pub struct AdmissionChain {
    whitelist: Whitelist,
    authenticator: TokenAuthenticator,
    limiter: RateLimiter,
}

impl AdmissionChain {
    pub fn new(whitelist: Whitelist, authenticator: TokenAuthenticator, limiter: RateLimiter) -> Self {
        Self {
            whitelist,
            authenticator,
            limiter,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            Whitelist::from_rules(&config.whitelist),
            TokenAuthenticator::new(config.token.clone()),
            RateLimiter::new(config.requests_per_minute),
        )
    }

    /// Run the ordered checks for one request.
    pub fn check(&self, addr: IpAddr, authorization: Option<&str>) -> Result<Admission, Rejection> {
        if self.whitelist.contains(&addr) {
            return Ok(Admission::Bypassed);
        }

        self.authenticator
            .authenticate(authorization)
            .map_err(Rejection::Unauthorized)?;

        if !self.limiter.allow(addr) {
            return Err(Rejection::RateLimited {
                limit: self.limiter.requests_per_minute(),
            });
        }

        Ok(Admission::Admitted)
    }
}

/// Middleware applying [`AdmissionChain`] to every request it wraps.
pub async fn admission_middleware(
    State(chain): State<Arc<AdmissionChain>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(ClientAddress(addr)) = request.extensions().get::<ClientAddress>().copied() else {
        tracing::error!("Client address missing from request extensions");
        return ApiError::Internal("client address unavailable".into()).into_response();
    };

    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match chain.check(addr, authorization) {
        Ok(admission) => {
            metrics::record_admission(match admission {
                Admission::Bypassed => "bypassed",
                Admission::Admitted => "admitted",
            });
            next.run(request).await
        }
        Err(rejection) => {
            let outcome = match rejection {
                Rejection::Unauthorized(_) => "unauthorized",
                Rejection::RateLimited { .. } => "rate_limited",
            };
            tracing::warn!(client = %addr, path = %request.uri().path(), ?rejection, "Request rejected");
            metrics::record_admission(outcome);
            ApiError::from(rejection).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(rpm: u32) -> AdmissionChain {
        AdmissionChain::new(
            Whitelist::from_rules(&["192.168.88.0/24"]),
            TokenAuthenticator::new("token"),
            RateLimiter::new(rpm),
        )
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_whitelist_bypasses_auth_and_rate_limit() {
        let chain = chain(1);
        for _ in 0..10 {
            assert_eq!(chain.check(ip("192.168.88.20"), None), Ok(Admission::Bypassed));
        }
        assert_eq!(chain.limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_auth_before_rate_limit() {
        let chain = chain(1);
        assert_eq!(
            chain.check(ip("203.0.113.1"), None),
            Err(Rejection::Unauthorized(AuthError::MissingCredential))
        );
        assert_eq!(
            chain.check(ip("203.0.113.1"), Some("Bearer nope")),
            Err(Rejection::Unauthorized(AuthError::InvalidCredential))
        );
        // Failed auth does not spend budget.
        assert_eq!(chain.limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_rate_limit_after_auth() {
        let chain = chain(2);
        let addr = ip("203.0.113.1");
        assert_eq!(chain.check(addr, Some("Bearer token")), Ok(Admission::Admitted));
        assert_eq!(chain.check(addr, Some("Bearer token")), Ok(Admission::Admitted));
        assert_eq!(
            chain.check(addr, Some("Bearer token")),
            Err(Rejection::RateLimited { limit: 2 })
        );
    }
}
