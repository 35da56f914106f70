//! Row types and API-facing shapes for servers and templates.

use serde::{Deserialize, Serialize};

/// Lifecycle of a managed machine. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ServerStatus {
    Pending,
    Confirmed,
    Installed,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Pending => "pending",
            ServerStatus::Confirmed => "confirmed",
            ServerStatus::Installed => "installed",
        }
    }

    /// The status a server must hold to move to `self`. Allowed moves are
    /// pending → confirmed → installed; nothing moves back to pending.
    pub fn predecessor(self) -> Option<ServerStatus> {
        match self {
            ServerStatus::Pending => None,
            ServerStatus::Confirmed => Some(ServerStatus::Pending),
            ServerStatus::Installed => Some(ServerStatus::Confirmed),
        }
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ServerStatus::Pending),
            "confirmed" => Ok(ServerStatus::Confirmed),
            "installed" => Ok(ServerStatus::Installed),
            other => Err(format!("unknown server status: {}", other)),
        }
    }
}

/// A stored server record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    pub id: i64,
    pub serial: String,
    pub hostname: String,
    pub ip_address: String,
    pub mac_address: String,
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
    pub status: ServerStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Self-reported machine facts, as accepted by an upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewServer {
    pub serial: String,
    pub hostname: String,
    pub ip_address: String,
    pub mac_address: String,
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

/// A stored, reusable rendering input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConfigTemplate {
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

impl ConfigTemplate {
    /// Package names from the free-form list (comma and/or whitespace separated).
    pub fn package_list(&self) -> Vec<&str> {
        self.packages
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Body of template create/update requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateInput {
    pub name: String,
    pub description: String,
    pub system_type: String,
    pub system_version: String,
    pub config_content: String,
    pub kernel_params: String,
    pub packages: String,
}
