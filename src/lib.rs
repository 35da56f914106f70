//! PXE bare-metal fleet manager library.

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pxe;
pub mod security;
pub mod storage;

pub use config::schema::ManagerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
