//! Wire types of the `/api` surface.

use serde::{Deserialize, Serialize};

/// Self-report body. `request_id`, `serial` and `mac_address` are required
/// by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerReport {
    pub request_id: String,
    pub serial: String,
    pub mac_address: String,
    pub hostname: String,
    pub ip_address: String,
    pub gateway: String,
    pub install_time: String,
    pub sda_size: String,
    pub part: String,
    pub system_version: String,
    pub kernel_version: String,
    pub cpu_model: String,
    pub cpu_processor: i64,
    pub mem_total: i64,
    pub memory_num: i64,
    pub lan_nic: String,
    pub lan_nic_speed: String,
    pub wan_nic: String,
    pub wan_nic_speed: String,
    pub bond_nic: String,
    pub bond_nic_speed: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerRecord {
    pub id: i64,
    pub serial: String,
    pub hostname: String,
    pub ip_address: String,
    pub mac_address: String,
    pub gateway: String,
    pub cpu_processor: i64,
    pub mem_total: i64,
    pub lan_nic: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub system_type: String,
    pub system_version: String,
    pub config_content: String,
    pub kernel_params: String,
    pub packages: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInput {
    pub name: String,
    pub description: String,
    pub system_type: String,
    pub system_version: String,
    pub config_content: String,
    pub kernel_params: String,
    pub packages: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn is_duplicate(&self) -> bool {
        self.status == "duplicate"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedId {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Artifacts {
    pub family: String,
    pub filename: String,
    pub legacy_path: String,
    #[serde(default)]
    pub uefi_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyResponse {
    pub status: String,
    pub message: String,
    pub artifacts: Artifacts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: String,
    pub client_ip: String,
    pub user_agent: String,
    pub method: String,
    pub path: String,
    pub action: String,
    pub target: String,
    pub outcome: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Audit page parameters; `None` leaves the server default.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}
