//! Config templates and applying them to servers.

use std::path::PathBuf;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::{parse_id, record_action, record_failure, StatusMessage};
use crate::audit::{AuditEvent, Outcome};
use crate::error::{ApiError, ApiResult};
use crate::http::request::RequestInfo;
use crate::http::server::AppState;
use crate::pxe::GeneratedArtifacts;
use crate::storage::{ConfigTemplate, TemplateInput};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedId {
    pub id: i64,
}

pub async fn list_configs(State(state): State<AppState>) -> ApiResult<Json<Vec<ConfigTemplate>>> {
    Ok(Json(state.db.templates().list().await?))
}

pub async fn get_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ConfigTemplate>> {
    let id = parse_id(&id)?;
    state
        .db
        .templates()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("template {} not found", id)))
}

fn template_input(body: Result<Json<TemplateInput>, JsonRejection>) -> ApiResult<TemplateInput> {
    let Json(input) =
        body.map_err(|e| ApiError::Validation(format!("invalid request body: {}", e.body_text())))?;
    if input.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }
    if input.system_type.trim().is_empty() {
        return Err(ApiError::Validation("systemType is required".into()));
    }
    Ok(input)
}

pub async fn create_config(
    State(state): State<AppState>,
    info: RequestInfo,
    body: Result<Json<TemplateInput>, JsonRejection>,
) -> ApiResult<Json<CreatedId>> {
    let input = match template_input(body) {
        Ok(input) => input,
        Err(err) => {
            record_failure(&state.audit, &info, "create_config", "", &err);
            return Err(err);
        }
    };

    let result = state.db.templates().create(&input).await.map_err(ApiError::from);
    let target = match &result {
        Ok(id) => id.to_string(),
        Err(_) => input.name.clone(),
    };
    record_action(&state.audit, &info, "create_config", &target, &result);

    let id = result?;
    tracing::info!(id, name = %input.name, system_type = %input.system_type, "Config template created");
    Ok(Json(CreatedId { id }))
}

pub async fn update_config(
    State(state): State<AppState>,
    info: RequestInfo,
    Path(raw_id): Path<String>,
    body: Result<Json<TemplateInput>, JsonRejection>,
) -> ApiResult<Json<StatusMessage>> {
    let result = async {
        let id = parse_id(&raw_id)?;
        let input = template_input(body)?;
        state.db.templates().update(id, &input).await?;
        Ok::<(), ApiError>(())
    }
    .await;
    record_action(&state.audit, &info, "update_config", &raw_id, &result);

    result?;
    Ok(Json(StatusMessage::success("config template updated")))
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplyQuery {
    #[serde(default)]
    pub serial: Option<String>,
}

/// Files written by an apply, as reported to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedArtifacts {
    pub family: String,
    pub filename: String,
    pub legacy_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uefi_path: Option<PathBuf>,
}

impl From<GeneratedArtifacts> for AppliedArtifacts {
    fn from(artifacts: GeneratedArtifacts) -> Self {
        Self {
            family: artifacts.family.as_str().to_string(),
            filename: artifacts.filename,
            legacy_path: artifacts.legacy_path,
            uefi_path: artifacts.uefi_path,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyResponse {
    pub status: String,
    pub message: String,
    pub artifacts: AppliedArtifacts,
}

pub async fn apply_config(
    State(state): State<AppState>,
    info: RequestInfo,
    Path(raw_id): Path<String>,
    query: Result<Query<ApplyQuery>, QueryRejection>,
) -> ApiResult<Json<ApplyResponse>> {
    let serial = query
        .ok()
        .and_then(|Query(q)| q.serial)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let result = apply(&state, &raw_id, &serial).await;

    let target = if serial.is_empty() { raw_id.as_str() } else { serial.as_str() };
    let event = match &result {
        Ok(artifacts) => AuditEvent::new("apply_config", target, Outcome::Success)
            .with_metadata("family", artifacts.family.as_str())
            .with_metadata("filename", artifacts.filename.as_str()),
        Err(e) => AuditEvent::new("apply_config", target, Outcome::Failure).with_error(e),
    };
    state
        .audit
        .record(event.with_request(&info).with_metadata("templateId", raw_id.as_str()));

    let artifacts = result?;
    Ok(Json(ApplyResponse {
        status: "success".into(),
        message: format!("config applied to server {}", serial),
        artifacts: artifacts.into(),
    }))
}

async fn apply(state: &AppState, raw_id: &str, serial: &str) -> ApiResult<GeneratedArtifacts> {
    let id = parse_id(raw_id)?;
    if serial.is_empty() {
        return Err(ApiError::Validation("serial query parameter is required".into()));
    }

    let server = state
        .db
        .servers()
        .get(serial)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("server {} not found", serial)))?;
    let template = state
        .db
        .templates()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("template {} not found", id)))?;

    let generator = state.generator.clone();
    let artifacts = tokio::task::spawn_blocking(move || generator.generate(&server, &template))
        .await
        .map_err(|e| ApiError::Internal(format!("boot config task failed: {}", e)))??;

    Ok(artifacts)
}
