//! Audit trail.
//!
//! # Data Flow
//! ```text
//! handlers (action events: report, confirm_server, apply_config, ...)
//! middleware.rs (one http_request event per request, optional)
//!     → sink.rs (timestamp, serialize, append under lock)
//!     → <audit.log_path> (JSON lines)
//!     → GET /api/audit/logs (read_page)
//! ```
//!
//! # Design Decisions
//! - The sink is handed to handlers through router state, never looked up
//!   from ambient context
//! - Writing an audit line is best-effort: failures are logged and counted
//!   but never change the response

pub mod event;
pub mod middleware;
pub mod sink;

pub use event::{AuditEvent, Outcome};
pub use middleware::audit_request_middleware;
pub use sink::{AuditError, AuditSink, Order, PageQuery};
