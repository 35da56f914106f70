//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the manager.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the PXE manager.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ManagerConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// SQLite storage settings.
    pub database: DatabaseConfig,

    /// Admission settings (token, whitelist, rate limit).
    pub auth: AuthConfig,

    /// Audit log settings.
    pub audit: AuditConfig,

    /// Boot artifact output settings.
    pub tftp: TftpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 1024 * 1024,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file, or ":memory:".
    pub sqlite_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "./data/pxe.db".to_string(),
        }
    }
}

/// Admission chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared bearer secret. Overridden by `PXE_AUTH_TOKEN`.
    pub token: String,

    /// Literal addresses or CIDR blocks exempt from auth and rate limiting.
    pub whitelist: Vec<String>,

    /// Per-client request budget (also the burst size).
    pub requests_per_minute: u32,

    /// Peers whose `X-Forwarded-For` header is honored.
    pub trusted_proxies: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            whitelist: vec!["192.168.88.0/24".to_string()],
            requests_per_minute: 100,
            trusted_proxies: vec![
                "127.0.0.1/32".to_string(),
                "::1/128".to_string(),
                "10.0.0.0/8".to_string(),
                "172.16.0.0/12".to_string(),
                "192.168.0.0/16".to_string(),
            ],
        }
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Enable the audit log.
    pub enabled: bool,

    /// Path of the JSON-lines log file.
    pub log_path: String,

    /// Also record one `http_request` event per request.
    pub log_requests: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: "./logs/audit.log".to_string(),
            log_requests: true,
        }
    }
}

/// Boot artifact configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TftpConfig {
    /// TFTP root directory.
    pub root: String,

    /// Also write the UEFI (GRUB) descriptor.
    pub enable_uefi: bool,

    /// Legacy (pxelinux) sub-directory under the root.
    pub legacy_boot_path: String,

    /// UEFI sub-directory under the root.
    pub uefi_boot_path: String,

    /// UEFI descriptor file name.
    pub uefi_config_file: String,

    /// Base URL installers use to fetch rendered documents.
    pub boot_server_url: String,
}

impl Default for TftpConfig {
    fn default() -> Self {
        Self {
            root: "/var/lib/tftpboot".to_string(),
            enable_uefi: true,
            legacy_boot_path: "pxelinux.cfg".to_string(),
            uefi_boot_path: "efi/boot".to_string(),
            uefi_config_file: "grub.cfg".to_string(),
            boot_server_url: "http://192.168.88.1".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
