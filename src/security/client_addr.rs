//! Client address resolution.
//!
//! # Responsibilities
//! - Resolve the address a request is attributed to (rate limiting,
//!   whitelist, audit)
//! - Honor `X-Forwarded-For` only when the TCP peer is a trusted proxy
//!
//! # Design Decisions
//! - Never trust `X-Forwarded-*` from untrusted peers
//! - Walk the forwarded chain right to left, skipping trusted hops
//! - Addresses are canonicalised (IPv4-mapped IPv6 becomes IPv4)

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::security::whitelist::Whitelist;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The resolved client address, stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddress(pub IpAddr);

impl std::fmt::Display for ClientAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Resolve the client address from the TCP peer and forwarding headers.
pub fn client_address(peer: IpAddr, headers: &HeaderMap, trusted: &Whitelist) -> IpAddr {
    let peer = peer.to_canonical();
    if !trusted.contains(&peer) {
        return peer;
    }

    let hops: Vec<IpAddr> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
        .map(|ip| ip.to_canonical())
        .collect();

    hops.iter()
        .rev()
        .find(|ip| !trusted.contains(ip))
        .or_else(|| hops.first())
        .copied()
        .unwrap_or(peer)
}

/// Middleware resolving [`ClientAddress`] once per request.
pub async fn client_address_middleware(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(trusted): State<std::sync::Arc<Whitelist>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let addr = client_address(peer.ip(), request.headers(), &trusted);
    request.extensions_mut().insert(ClientAddress(addr));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn trusted() -> Whitelist {
        Whitelist::from_rules(&["127.0.0.1/32", "10.0.0.0/8"])
    }

    fn xff(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_untrusted_peer_ignores_header() {
        let addr = client_address(ip("203.0.113.5"), &xff("1.2.3.4"), &trusted());
        assert_eq!(addr, ip("203.0.113.5"));
    }

    #[test]
    fn test_trusted_peer_uses_first_untrusted_hop() {
        let addr = client_address(ip("127.0.0.1"), &xff("6.6.6.6, 198.51.100.9, 10.1.1.1"), &trusted());
        assert_eq!(addr, ip("198.51.100.9"));
    }

    #[test]
    fn test_all_trusted_hops_use_leftmost() {
        let addr = client_address(ip("127.0.0.1"), &xff("10.2.2.2, 10.1.1.1"), &trusted());
        assert_eq!(addr, ip("10.2.2.2"));
    }

    #[test]
    fn test_trusted_peer_without_header() {
        let addr = client_address(ip("10.0.0.3"), &HeaderMap::new(), &trusted());
        assert_eq!(addr, ip("10.0.0.3"));

        let addr = client_address(ip("10.0.0.3"), &xff("garbage"), &trusted());
        assert_eq!(addr, ip("10.0.0.3"));
    }

    #[test]
    fn test_mapped_peer_is_canonicalised() {
        let addr = client_address(ip("::ffff:203.0.113.5"), &HeaderMap::new(), &trusted());
        assert_eq!(addr, ip("203.0.113.5"));
    }
}
