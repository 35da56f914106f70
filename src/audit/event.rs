//! Audit event records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::request::RequestInfo;

/// What happened to the audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    Duplicate,
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Assigned by the sink at append time.
    pub timestamp: DateTime<Utc>,
    pub client_ip: String,
    pub user_agent: String,
    pub method: String,
    pub path: String,
    pub action: String,
    pub target: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, Value>>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, target: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            timestamp: Utc::now(),
            client_ip: String::new(),
            user_agent: String::new(),
            method: String::new(),
            path: String::new(),
            action: action.into(),
            target: target.into(),
            outcome,
            error: None,
            metadata: None,
        }
    }

    /// Copy client and request line details from the current request.
    pub fn with_request(mut self, info: &RequestInfo) -> Self {
        self.client_ip = info.client_ip.clone();
        self.user_agent = info.user_agent.clone();
        self.method = info.method.clone();
        self.path = info.path.clone();
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let event = AuditEvent::new("report", "SN001", Outcome::Duplicate);
        let json: Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["action"], "report");
        assert_eq!(json["outcome"], "duplicate");
        assert!(json.get("clientIp").is_some());
        assert!(json.get("error").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_builder_helpers() {
        let event = AuditEvent::new("apply_config", "SN001", Outcome::Failure)
            .with_error("disk full")
            .with_metadata("templateId", 3)
            .with_metadata("family", "kickstart");

        assert_eq!(event.error.as_deref(), Some("disk full"));
        let metadata = event.metadata.unwrap();
        assert_eq!(metadata["templateId"], 3);
        assert_eq!(metadata["family"], "kickstart");
    }
}
