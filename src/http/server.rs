//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all API handlers
//! - Wire up middleware (request ID, tracing, timeout, concurrency, metrics)
//! - Apply routing policy updates from the config watcher
//! - Serve until the shutdown signal fires

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{RouterConfig, RoutingConfig};
use crate::http::handlers;
use crate::http::request::{make_request_span, MakeRequestUuidV4};
use crate::lifecycle::RouterCore;
use crate::observability::metrics;
use crate::store::SnapshotError;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub core: RouterCore,
    pub admin_api_key: Arc<String>,
}

/// HTTP server for the public routing API.
pub struct HttpServer {
    router: Router,
    core: RouterCore,
}

impl HttpServer {
    /// Create a server around an already-built routing core.
    pub fn new(config: RouterConfig, core: RouterCore) -> Self {
        let state = AppState {
            core: core.clone(),
            admin_api_key: Arc::new(config.admin.api_key.clone()),
        };
        let router = Self::build_router(&config, state);
        Self { router, core }
    }

    /// Build the routing core from configuration, then the server.
    pub fn from_config(config: RouterConfig) -> Result<Self, SnapshotError> {
        let core = crate::lifecycle::build_core(&config)?;
        Ok(Self::new(config, core))
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        let in_flight = Arc::new(Semaphore::new(config.listener.max_connections));

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/v1/responders/location", post(handlers::register_location))
            .route("/api/v1/responders/{responder_id}", get(handlers::get_responder))
            .route("/api/v1/responders/{responder_id}/verify", post(handlers::verify_responder))
            .route(
                "/api/v1/authority",
                get(handlers::get_authority).put(handlers::set_authority),
            )
            .route("/api/v1/alerts/{alert_id}/route", post(handlers::route_alert))
            .route(
                "/api/v1/alerts/{alert_id}/routing",
                get(handlers::get_routing).delete(handlers::reset_routing),
            )
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(middleware::from_fn(track_metrics))
                    .layer(middleware::from_fn_with_state(in_flight, limit_in_flight))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn core(&self) -> &RouterCore {
        &self.core
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Routing policies arriving on `policy_updates` replace the engine's
    /// policy for later attempts.
    pub async fn run(
        self,
        listener: TcpListener,
        mut policy_updates: mpsc::UnboundedReceiver<RoutingConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let engine = self.core.engine.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = policy_updates.recv() => match update {
                        Some(policy) => engine.update_policy(policy),
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Record request count and latency.
async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

/// Cap concurrent in-flight requests; excess requests wait for a slot.
async fn limit_in_flight(
    State(in_flight): State<Arc<Semaphore>>,
    request: Request,
    next: Next,
) -> Response {
    match in_flight.acquire_owned().await {
        Ok(_permit) => next.run(request).await,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
