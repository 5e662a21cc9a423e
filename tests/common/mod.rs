//! Shared utilities for integration tests.

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use alert_router::config::{RouterConfig, RoutingConfig};
use alert_router::http::HttpServer;
use alert_router::lifecycle::{RouterCore, Shutdown};

/// A router serving on an ephemeral local port.
pub struct TestRouter {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    /// Sender for routing policy reloads.
    #[allow(dead_code)]
    pub config_tx: mpsc::UnboundedSender<RoutingConfig>,
    /// The core the server routes through.
    #[allow(dead_code)]
    pub core: RouterCore,
}

impl TestRouter {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestRouter {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a router with `root` as the registry authority.
pub async fn start_router() -> TestRouter {
    let mut config = RouterConfig::default();
    config.authority.initial = Some("root".into());
    start_router_with(config).await
}

/// Start a router with an explicit configuration.
pub async fn start_router_with(mut config: RouterConfig) -> TestRouter {
    config.listener.bind_address = "127.0.0.1:0".into();
    config.observability.metrics_enabled = false;

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::from_config(config).unwrap();
    let core = server.core().clone();
    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_rx, rx).await;
    });

    TestRouter { addr, shutdown, config_tx, core }
}

/// Degrees to the 10^7 fixed-point scale used on the wire.
pub fn scaled(degrees: f64) -> i64 {
    (degrees * 1e7).round() as i64
}
