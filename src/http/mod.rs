//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, request facts for audit)
//!     → api handlers
//!     → response.rs (ApiError → status + JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestInfo, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
