//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use pxe_manager::config::ManagerConfig;
use pxe_manager::http::HttpServer;
use pxe_manager::lifecycle::Shutdown;
use pxe_manager::storage::Database;
use pxe_sdk::{PxeClient, ServerReport, TemplateInput};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";

/// A running server on an ephemeral port with throwaway state.
pub struct TestServer {
    pub addr: SocketAddr,
    pub tftp_root: PathBuf,
    pub audit_path: PathBuf,
    shutdown: Shutdown,
    _dir: TempDir,
}

impl TestServer {
    /// Start with test defaults: token auth, empty whitelist, generous rate
    /// limit. `configure` may adjust anything before startup.
    pub async fn start(configure: impl FnOnce(&mut ManagerConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let tftp_root = dir.path().join("tftpboot");
        let audit_path = dir.path().join("logs/audit.log");

        let mut config = ManagerConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();
        config.database.sqlite_path = ":memory:".into();
        config.auth.token = TOKEN.into();
        config.auth.whitelist = Vec::new();
        config.auth.requests_per_minute = 1000;
        config.audit.log_path = audit_path.to_string_lossy().into_owned();
        config.tftp.root = tftp_root.to_string_lossy().into_owned();
        configure(&mut config);

        let db = Database::new(&config.database.sqlite_path).await.unwrap();
        let server = HttpServer::new(config, db);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, receiver).await;
        });

        Self {
            addr,
            tftp_root,
            audit_path,
            shutdown,
            _dir: dir,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn http(&self) -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    /// SDK client without credentials.
    pub fn anonymous(&self) -> PxeClient {
        PxeClient::with_http_client(&self.url(), self.http())
    }

    /// SDK client with the configured token.
    pub fn client(&self) -> PxeClient {
        self.anonymous().with_token(TOKEN)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn report(request_id: &str, serial: &str, mac: &str) -> ServerReport {
    ServerReport {
        request_id: request_id.into(),
        serial: serial.into(),
        mac_address: mac.into(),
        hostname: "node-01".into(),
        ip_address: "192.168.88.10".into(),
        gateway: "192.168.88.1".into(),
        lan_nic: "eth0".into(),
        cpu_processor: 16,
        mem_total: 64,
        ..Default::default()
    }
}

pub fn template(name: &str, system_type: &str) -> TemplateInput {
    TemplateInput {
        name: name.into(),
        system_type: system_type.into(),
        system_version: "7".into(),
        config_content: "rootpw --lock".into(),
        kernel_params: "console=ttyS0".into(),
        packages: "vim,net-tools".into(),
        ..Default::default()
    }
}
