use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::types::*;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SdkError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            SdkError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Typed client for one pxe-manager instance.
#[derive(Clone)]
pub struct PxeClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl PxeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, TLS).
    pub fn with_http_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            ..Self::new(base_url)
        }
    }

    /// Send `Authorization: Bearer <token>` on every request.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub async fn health(&self) -> Result<serde_json::Value, SdkError> {
        self.send(self.request(reqwest::Method::GET, "/api/health")).await
    }

    /// Submit a self-report. A repeated `request_id` comes back as
    /// `status == "duplicate"`, not as an error.
    pub async fn report(&self, report: &ServerReport) -> Result<StatusMessage, SdkError> {
        self.send(self.request(reqwest::Method::POST, "/api/report").json(report))
            .await
    }

    pub async fn list_servers(&self, status: Option<&str>) -> Result<Vec<ServerRecord>, SdkError> {
        let mut req = self.request(reqwest::Method::GET, "/api/servers");
        if let Some(status) = status {
            req = req.query(&[("status", status)]);
        }
        self.send(req).await
    }

    pub async fn get_server(&self, serial: &str) -> Result<ServerRecord, SdkError> {
        self.send(self.request(reqwest::Method::GET, &format!("/api/servers/{}", serial)))
            .await
    }

    pub async fn confirm_server(&self, serial: &str) -> Result<StatusMessage, SdkError> {
        self.send(self.request(reqwest::Method::POST, &format!("/api/servers/{}/confirm", serial)))
            .await
    }

    pub async fn mark_installed(&self, serial: &str) -> Result<StatusMessage, SdkError> {
        self.send(self.request(reqwest::Method::POST, &format!("/api/servers/{}/install", serial)))
            .await
    }

    pub async fn list_templates(&self) -> Result<Vec<Template>, SdkError> {
        self.send(self.request(reqwest::Method::GET, "/api/configs")).await
    }

    pub async fn get_template(&self, id: i64) -> Result<Template, SdkError> {
        self.send(self.request(reqwest::Method::GET, &format!("/api/configs/{}", id)))
            .await
    }

    pub async fn create_template(&self, input: &TemplateInput) -> Result<i64, SdkError> {
        let created: CreatedId = self
            .send(self.request(reqwest::Method::POST, "/api/configs").json(input))
            .await?;
        Ok(created.id)
    }

    pub async fn update_template(&self, id: i64, input: &TemplateInput) -> Result<StatusMessage, SdkError> {
        self.send(
            self.request(reqwest::Method::PUT, &format!("/api/configs/{}", id))
                .json(input),
        )
        .await
    }

    /// Generate boot artifacts for `serial` from template `id`.
    pub async fn apply_template(&self, id: i64, serial: &str) -> Result<ApplyResponse, SdkError> {
        self.send(
            self.request(reqwest::Method::POST, &format!("/api/configs/{}/apply", id))
                .query(&[("serial", serial)]),
        )
        .await
    }

    pub async fn audit_logs(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>, SdkError> {
        self.send(self.request(reqwest::Method::GET, "/api/audit/logs").query(query))
            .await
    }

    /// Raw GET for callers that need headers or non-JSON bodies.
    pub async fn get_raw(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.request(reqwest::Method::GET, path).send().await
    }

    /// Raw POST with a JSON body.
    pub async fn post_raw<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response, reqwest::Error> {
        self.request(reqwest::Method::POST, path).json(body).send().await
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let req = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, SdkError> {
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(SdkError::Api { status, body: text });
        }
        Ok(serde_json::from_str(&text)?)
    }
}
