//! PXE bare-metal fleet manager.
//!
//! # Architecture Overview
//!
//! ```text
//!   installer / admin ──HTTP──▶ ┌──────────────────────────────────────────┐
//!                               │ http: request id, trace, body limit      │
//!                               │ security: client address → admission     │
//!                               │   (whitelist bypass → bearer → rate)     │
//!                               │ audit: http_request events               │
//!                               ├──────────────────────────────────────────┤
//!                               │ api: report, servers, configs, audit     │
//!                               ├───────────────┬──────────────────────────┤
//!                               │ storage       │ pxe generator            │
//!                               │ (SQLite)      │ → <tftp root>/pxelinux.cfg│
//!                               └───────────────┴──────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use pxe_manager::config;
use pxe_manager::lifecycle::{signals, startup, Shutdown};
use pxe_manager::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "pxe-manager", version, about = "PXE bare-metal fleet manager")]
struct Args {
    /// Path to the TOML configuration file. Missing file means defaults.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = config::load_or_default(&args.config)?;
    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pxe-manager starting");
    tracing::info!(
        config = %args.config.display(),
        bind_address = %config.listener.bind_address,
        database = %config.database.sqlite_path,
        tftp_root = %config.tftp.root,
        requests_per_minute = config.auth.requests_per_minute,
        whitelist_rules = config.auth.whitelist.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated at load time.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = startup::build_server(config).await?;
    let listener = startup::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown.clone());

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
