//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ManagerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `auth.token`.
pub const AUTH_TOKEN_ENV: &str = "PXE_AUTH_TOKEN";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ManagerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ManagerConfig = toml::from_str(&content)?;
    finish(config)
}

/// Load the file if it exists, otherwise start from defaults.
///
/// Either way the environment overrides are applied before validation.
pub fn load_or_default(path: &Path) -> Result<ManagerConfig, ConfigError> {
    if path.exists() {
        return load_config(path);
    }
    tracing::warn!(path = %path.display(), "Config file not found, using defaults");
    finish(ManagerConfig::default())
}

fn finish(mut config: ManagerConfig) -> Result<ManagerConfig, ConfigError> {
    apply_env_overrides(&mut config, std::env::var(AUTH_TOKEN_ENV).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut ManagerConfig, token: Option<String>) {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        config.auth.token = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [auth]
            token = "from-file"
            whitelist = ["10.1.0.0/16", "::1"]
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.auth.whitelist.len(), 2);
    }

    #[test]
    fn test_invalid_rule_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[auth]\nwhitelist = [\"300.0.0.1\"]").unwrap();

        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_env_token_overrides_file() {
        let mut config = ManagerConfig::default();
        config.auth.token = "from-file".into();

        apply_env_overrides(&mut config, Some(String::new()));
        assert_eq!(config.auth.token, "from-file");

        apply_env_overrides(&mut config, Some("from-env".into()));
        assert_eq!(config.auth.token, "from-env");
    }
}
