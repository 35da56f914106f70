//! Audit log paging.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::audit::{AuditEvent, Order, PageQuery};
use crate::error::{ApiError, ApiResult};
use crate::http::server::AppState;

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order: Option<String>,
}

impl AuditLogQuery {
    /// Missing or non-positive limits mean the default; large ones are capped.
    pub fn page(&self) -> ApiResult<PageQuery> {
        let limit = match self.limit {
            Some(n) if n > 0 => (n as u64).min(MAX_LIMIT as u64) as usize,
            _ => DEFAULT_LIMIT,
        };
        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let order = match self.order.as_deref().map(str::trim) {
            None | Some("") => Order::Desc,
            Some(raw) if raw.eq_ignore_ascii_case("desc") => Order::Desc,
            Some(raw) if raw.eq_ignore_ascii_case("asc") => Order::Asc,
            Some(raw) => {
                return Err(ApiError::Validation(format!(
                    "order must be 'asc' or 'desc', got '{}'",
                    raw
                )))
            }
        };
        Ok(PageQuery { limit, offset, order })
    }
}

pub async fn list_audit_logs(
    State(state): State<AppState>,
    query: Result<Query<AuditLogQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<AuditEvent>>> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    let page = query.page()?;

    let sink = state.audit.clone();
    let events = tokio::task::spawn_blocking(move || sink.read_page(page))
        .await
        .map_err(|e| ApiError::Internal(format!("audit read task failed: {}", e)))??;

    Ok(Json(events))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<i64>, offset: Option<i64>, order: Option<&str>) -> AuditLogQuery {
        AuditLogQuery {
            limit,
            offset,
            order: order.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let page = query(None, None, None).page().unwrap();
        assert_eq!(page, PageQuery { limit: 100, offset: 0, order: Order::Desc });
    }

    #[test]
    fn test_limit_bounds() {
        assert_eq!(query(Some(0), None, None).page().unwrap().limit, 100);
        assert_eq!(query(Some(-5), None, None).page().unwrap().limit, 100);
        assert_eq!(query(Some(5000), None, None).page().unwrap().limit, 1000);
        assert_eq!(query(Some(7), Some(-3), None).page().unwrap().offset, 0);
    }

    #[test]
    fn test_order_parsing() {
        assert_eq!(query(None, None, Some("ASC")).page().unwrap().order, Order::Asc);
        assert_eq!(query(None, None, Some("desc")).page().unwrap().order, Order::Desc);
        assert!(query(None, None, Some("sideways")).page().is_err());
    }
}
