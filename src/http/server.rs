//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the `/api` routes
//! - Wire up middleware (request ID, tracing, body limit, client address,
//!   request audit, admission)
//! - Bind server to listener and stop on the shutdown signal
//!
//! # Layer Order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → BodyLimit → metrics
//!     → client address → request audit → admission → handler
//! ```
//! Request audit sits outside admission so rejected requests are recorded.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::api;
use crate::audit::{audit_request_middleware, AuditSink};
use crate::config::ManagerConfig;
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::pxe::BootConfigGenerator;
use crate::security::{admission_middleware, client_address_middleware, AdmissionChain, Whitelist};
use crate::storage::Database;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ManagerConfig>,
    pub db: Database,
    pub audit: Arc<AuditSink>,
    pub generator: Arc<BootConfigGenerator>,
}

/// HTTP server for the fleet manager API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server over an opened database.
    pub fn new(config: ManagerConfig, db: Database) -> Self {
        let admission = Arc::new(AdmissionChain::from_config(&config.auth));
        let trusted_proxies = Arc::new(Whitelist::from_rules(&config.auth.trusted_proxies));

        let state = AppState {
            audit: Arc::new(AuditSink::from_config(&config.audit)),
            generator: Arc::new(BootConfigGenerator::from_config(&config.tftp)),
            config: Arc::new(config),
            db,
        };

        let router = Self::build_router(state.clone(), admission, trusted_proxies);
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        state: AppState,
        admission: Arc<AdmissionChain>,
        trusted_proxies: Arc<Whitelist>,
    ) -> Router {
        let config = state.config.clone();

        let mut api = api::api_router(state.clone())
            .layer(middleware::from_fn_with_state(admission, admission_middleware));
        if config.audit.enabled && config.audit.log_requests {
            api = api.layer(middleware::from_fn_with_state(
                state.audit.clone(),
                audit_request_middleware,
            ));
        }

        Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(
                trusted_proxies,
                client_address_middleware,
            ))
            .layer(middleware::from_fn(track_metrics))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .headers()
                            .get(X_REQUEST_ID)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("-");
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id,
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.listener.max_body_size)),
            )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            audit = self.state.audit.is_enabled(),
            uefi = self.state.config.tftp.enable_uefi,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
