//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, PXE_AUTH_TOKEN override)
//!     → validation.rs (semantic checks)
//!     → ManagerConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The shared secret comes from the environment when set

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AuditConfig, AuthConfig, DatabaseConfig, ListenerConfig, ManagerConfig, ObservabilityConfig,
    TftpConfig,
};
