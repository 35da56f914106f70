//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Admission, reports, boot config generation, audit, HTTP:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty for operators, JSON for log shippers)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request span
//! - Metric recording is a no-op until an exporter is installed

pub mod logging;
pub mod metrics;
