//! Self-reports and the server lifecycle.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::{record_action, record_failure, StatusMessage};
use crate::audit::{AuditEvent, Outcome};
use crate::error::{ApiError, ApiResult};
use crate::http::request::RequestInfo;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::pxe::pxe_filename;
use crate::storage::{NewServer, ReportOutcome, Server, ServerStatus};

/// Body of `POST /api/report`: the server record plus a client-chosen
/// delivery id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub request_id: String,
    #[serde(flatten)]
    pub server: NewServer,
}

impl ReportRequest {
    fn validate(&self) -> ApiResult<()> {
        let missing: Vec<&str> = [
            ("requestId", &self.request_id),
            ("serial", &self.server.serial),
            ("macAddress", &self.server.mac_address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(ApiError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        pxe_filename(&self.server.mac_address)?;
        Ok(())
    }
}

pub async fn report(
    State(state): State<AppState>,
    info: RequestInfo,
    body: Result<Json<ReportRequest>, JsonRejection>,
) -> ApiResult<Json<StatusMessage>> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let err = ApiError::Validation(format!("invalid request body: {}", rejection.body_text()));
            record_failure(&state.audit, &info, "report", "", &err);
            metrics::record_report("invalid");
            return Err(err);
        }
    };

    let serial = request.server.serial.trim().to_string();

    if let Err(err) = request.validate() {
        record_failure(&state.audit, &info, "report", &serial, &err);
        metrics::record_report("invalid");
        return Err(err);
    }

    let mut server = request.server;
    server.serial = serial.clone();

    match state.db.servers().report(request.request_id.trim(), &server).await {
        Ok(ReportOutcome::Created) => {
            metrics::record_report("created");
            state.audit.record(
                AuditEvent::new("report", &serial, Outcome::Success)
                    .with_request(&info)
                    .with_metadata("requestId", request.request_id.as_str()),
            );
            tracing::info!(serial = %serial, mac = %server.mac_address, "Server report accepted");
            Ok(Json(StatusMessage::success(
                "server report received, awaiting confirmation",
            )))
        }
        Ok(ReportOutcome::Duplicate) => {
            metrics::record_report("duplicate");
            state.audit.record(
                AuditEvent::new("report", &serial, Outcome::Duplicate)
                    .with_request(&info)
                    .with_metadata("requestId", request.request_id.as_str()),
            );
            tracing::debug!(serial = %serial, request_id = %request.request_id, "Duplicate report ignored");
            Ok(Json(StatusMessage::duplicate("duplicate request ignored")))
        }
        Err(e) => {
            metrics::record_report("failure");
            let err = ApiError::from(e);
            record_failure(&state.audit, &info, "report", &serial, &err);
            Err(err)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListServersQuery {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn list_servers(
    State(state): State<AppState>,
    query: Result<Query<ListServersQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Server>>> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;

    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<ServerStatus>()
                .map_err(|_| ApiError::Validation(format!("unknown status '{}'", raw)))?,
        ),
    };

    Ok(Json(state.db.servers().list(status).await?))
}

pub async fn get_server(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> ApiResult<Json<Server>> {
    state
        .db
        .servers()
        .get(&serial)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("server {} not found", serial)))
}

pub async fn confirm_server(
    State(state): State<AppState>,
    info: RequestInfo,
    Path(serial): Path<String>,
) -> ApiResult<Json<StatusMessage>> {
    transition(&state, &info, &serial, ServerStatus::Confirmed, "confirm_server").await?;
    Ok(Json(StatusMessage::success("server confirmed")))
}

pub async fn mark_installed(
    State(state): State<AppState>,
    info: RequestInfo,
    Path(serial): Path<String>,
) -> ApiResult<Json<StatusMessage>> {
    transition(&state, &info, &serial, ServerStatus::Installed, "mark_installed").await?;
    Ok(Json(StatusMessage::success("server marked as installed")))
}

async fn transition(
    state: &AppState,
    info: &RequestInfo,
    serial: &str,
    status: ServerStatus,
    action: &str,
) -> ApiResult<()> {
    let result = state
        .db
        .servers()
        .set_status(serial, status)
        .await
        .map_err(ApiError::from);
    record_action(&state.audit, info, action, serial, &result);
    if result.is_ok() {
        tracing::info!(serial = %serial, status = %status, "Server status changed");
    }
    result
}
