//! HTTP-facing error taxonomy.
//!
//! Subsystems keep their own error enums; handlers convert into
//! [`ApiError`], which decides the status code. The response mapping lives
//! in `http::response`.

use thiserror::Error;

use crate::audit::AuditError;
use crate::pxe::BootConfigError;
use crate::security::auth::AuthError;
use crate::storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input. 400.
    #[error("{0}")]
    Validation(String),

    /// 401.
    #[error("{0}")]
    Unauthorized(AuthError),

    /// 404.
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with current state. 409.
    #[error("{0}")]
    Conflict(String),

    /// 429.
    #[error("rate limit exceeded")]
    RateLimited { limit: u32 },

    /// Database failure. 500.
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// Filesystem failure. 500.
    #[error("I/O error: {0}")]
    Io(String),

    /// 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            e @ StorageError::InvalidTransition { .. } => ApiError::Conflict(e.to_string()),
            e => ApiError::Storage(e),
        }
    }
}

impl From<BootConfigError> for ApiError {
    fn from(err: BootConfigError) -> Self {
        match err {
            e @ (BootConfigError::InvalidAddress(_) | BootConfigError::UnsupportedSystemType(_)) => {
                ApiError::Validation(e.to_string())
            }
            e @ BootConfigError::Io { .. } => ApiError::Io(e.to_string()),
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        ApiError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ServerStatus;

    #[test]
    fn test_storage_mapping() {
        assert!(matches!(
            ApiError::from(StorageError::NotFound("server SN001".into())),
            ApiError::NotFound(msg) if msg == "server SN001 not found"
        ));
        assert!(matches!(
            ApiError::from(StorageError::InvalidTransition {
                serial: "SN001".into(),
                from: ServerStatus::Installed,
                to: ServerStatus::Pending,
            }),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn test_boot_config_mapping() {
        assert!(matches!(
            ApiError::from(BootConfigError::UnsupportedSystemType("windows".into())),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(BootConfigError::Io {
                path: "/x".into(),
                source: std::io::Error::other("boom"),
            }),
            ApiError::Io(_)
        ));
    }
}
