//! Bearer token authentication.

use subtle::ConstantTimeEq;
use thiserror::Error;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a credential was refused. The two cases are reported to the client
/// with distinct messages; neither reveals the expected secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("invalid bearer credential")]
    InvalidCredential,
}

/// Compares a presented `Authorization` header against the shared secret.
#[derive(Clone)]
pub struct TokenAuthenticator {
    secret: String,
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("configured", &!self.secret.is_empty())
            .finish()
    }
}

impl TokenAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check the raw header value.
    ///
    /// No header or no `Bearer ` prefix is `MissingCredential`. An empty
    /// configured secret accepts nothing, so any presented token is
    /// `InvalidCredential`.
    pub fn authenticate(&self, header: Option<&str>) -> Result<(), AuthError> {
        let token = header
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .ok_or(AuthError::MissingCredential)?;

        if self.secret.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        if bool::from(token.as_bytes().ct_eq(self.secret.as_bytes())) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredential)
        }
    }
}
