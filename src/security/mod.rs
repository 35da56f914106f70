//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_addr.rs (resolve client address, trusted proxies)
//!     → admission.rs
//!         → whitelist.rs (trusted ranges skip everything below)
//!         → auth.rs (Bearer token, 401 on failure)
//!         → rate_limit.rs (per-address token bucket, 429 on failure)
//!     → Pass to API handlers
//! ```
//!
//! # Design Decisions
//! - Fail closed: malformed addresses never match the whitelist
//! - Missing and invalid credentials are reported distinctly
//! - No trust in forwarded headers from untrusted peers

pub mod admission;
pub mod auth;
pub mod client_addr;
pub mod rate_limit;
pub mod whitelist;

pub use admission::{admission_middleware, Admission, AdmissionChain, Rejection};
pub use auth::{AuthError, TokenAuthenticator};
pub use client_addr::{client_address_middleware, ClientAddress};
pub use rate_limit::RateLimiter;
pub use whitelist::Whitelist;
