//! Alert routing service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Caller (X-Caller-Id)
//!     ───────────────────▶ http server ──▶ handlers
//!                                            │
//!                 ┌──────────────────────────┼───────────────────────┐
//!                 ▼                          ▼                       ▼
//!           authority               responder directory        routing engine
//!       (registry authority,        (locations, verified  ◀───  (per-alert state,
//!        authorization guard)        index, radius query)        radius escalation)
//!
//!     Cross-cutting: config + hot reload, logging, metrics, snapshot store,
//!     logical clock, lifecycle (startup / signals / shutdown), admin API
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use alert_router::admin::serve_admin;
use alert_router::config::loader::load_config;
use alert_router::config::watcher::ConfigWatcher;
use alert_router::config::RouterConfig;
use alert_router::http::{AppState, HttpServer};
use alert_router::lifecycle::{signals::shutdown_signal, Shutdown};
use alert_router::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "alert-router", version, about = "Alert routing service")]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "alert-router starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        max_attempts = config.routing.max_attempts,
        default_search_radius_m = config.routing.default_search_radius_m,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::from_config(config.clone())?;
    let core = server.core().clone();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();

    // Keep the watcher alive for the life of the process.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::error!(error = %e, "Config watcher failed to start; hot reload disabled");
                    (None, updates)
                }
            }
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AppState {
            core: core.clone(),
            admin_api_key: std::sync::Arc::new(config.admin.api_key.clone()),
        };
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = serve_admin(admin_listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        shutdown.trigger();
    });

    server.run(listener, config_updates, server_shutdown).await?;

    match core.save_snapshot() {
        Ok(Some(path)) => tracing::info!(path = %path.display(), "Snapshot saved"),
        Ok(None) => {}
        Err(e) => tracing::error!(error = %e, "Failed to save snapshot"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
