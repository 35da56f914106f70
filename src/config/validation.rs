//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate address rules (whitelist, trusted proxies)
//! - Validate value ranges (rate limit > 0, paths non-empty)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ManagerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ManagerConfig;
use crate::observability::logging::LogFormat;
use crate::security::whitelist::AddressRule;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid address rule '{value}'")]
    InvalidRule { field: &'static str, value: String },

    #[error("{field}: invalid socket address '{value}'")]
    InvalidSocketAddr { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("auth.requests_per_minute must be greater than zero")]
    ZeroRateLimit,

    #[error("observability.log_format must be 'pretty', 'text' or 'json', got '{0}'")]
    UnknownLogFormat(String),
}

/// Validate a loaded configuration, collecting every problem.
pub fn validate_config(config: &ManagerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddr {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    check_rules("auth.whitelist", &config.auth.whitelist, &mut errors);
    check_rules("auth.trusted_proxies", &config.auth.trusted_proxies, &mut errors);

    if config.auth.requests_per_minute == 0 {
        errors.push(ValidationError::ZeroRateLimit);
    }

    if config.audit.enabled && config.audit.log_path.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "audit.log_path" });
    }

    if config.database.sqlite_path.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "database.sqlite_path" });
    }

    if config.tftp.root.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "tftp.root" });
    }
    if config.tftp.enable_uefi && config.tftp.uefi_config_file.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "tftp.uefi_config_file" });
    }

    if LogFormat::parse(&config.observability.log_format).is_none() {
        errors.push(ValidationError::UnknownLogFormat(config.observability.log_format.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidSocketAddr {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rules(field: &'static str, rules: &[String], errors: &mut Vec<ValidationError>) {
    for rule in rules {
        if rule.parse::<AddressRule>().is_err() {
            errors.push(ValidationError::InvalidRule {
                field,
                value: rule.clone(),
            });
        }
    }
}
