//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the database and apply migrations
//! - Build the HTTP server from the validated configuration
//! - Bind the listener last

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{AuthConfig, ManagerConfig};
use crate::http::HttpServer;
use crate::security::whitelist::AddressRule;
use crate::storage::{Database, StorageError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open database: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Open storage and build the server. Does not bind.
pub async fn build_server(config: ManagerConfig) -> Result<HttpServer, StartupError> {
    let db = Database::new(&config.database.sqlite_path).await?;

    if config.auth.token.is_empty() {
        tracing::warn!("No auth token configured; only whitelisted clients will be admitted");
    }
    if whitelist_reachable_through_proxies(&config.auth) {
        tracing::warn!(
            whitelist = ?config.auth.whitelist,
            trusted_proxies = ?config.auth.trusted_proxies,
            "Non-loopback trusted proxies can claim a whitelisted address via X-Forwarded-For \
             and bypass auth and rate limiting"
        );
    }
    if config.audit.enabled {
        tracing::info!(path = %config.audit.log_path, "Audit log enabled");
    }

    Ok(HttpServer::new(config, db))
}

/// True when a whitelist is configured and some trusted proxy range reaches
/// beyond loopback, so a peer in that range controls which address is
/// checked against the whitelist.
fn whitelist_reachable_through_proxies(auth: &AuthConfig) -> bool {
    !auth.whitelist.is_empty()
        && auth.trusted_proxies.iter().any(|raw| match raw.parse::<AddressRule>() {
            Ok(AddressRule::Addr(ip)) => !ip.is_loopback(),
            Ok(AddressRule::Net(net)) => !(net.network().is_loopback() && net.broadcast().is_loopback()),
            Err(_) => false,
        })
}

pub async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_proxies_expose_whitelist() {
        assert!(whitelist_reachable_through_proxies(&AuthConfig::default()));
    }

    #[test]
    fn test_loopback_proxies_or_empty_whitelist_are_quiet() {
        let mut auth = AuthConfig {
            trusted_proxies: vec!["127.0.0.1/32".into(), "::1".into()],
            ..AuthConfig::default()
        };
        assert!(!whitelist_reachable_through_proxies(&auth));

        auth.trusted_proxies.push("10.0.0.0/8".into());
        assert!(whitelist_reachable_through_proxies(&auth));

        auth.whitelist.clear();
        assert!(!whitelist_reachable_through_proxies(&auth));
    }
}
