use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::config::RoutingConfig;
use crate::directory::ResponderLocation;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::identity::{CallerId, ResponderId};
use crate::routing::RoutingSummary;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub clock: u64,
    pub authority_set: bool,
    pub registered_responders: usize,
    pub verified_responders: usize,
    pub policy: RoutingConfig,
}

#[derive(Serialize)]
pub struct ResponderEntry {
    pub responder: ResponderId,
    pub location: ResponderLocation,
}

#[derive(Deserialize)]
pub struct BootstrapRequest {
    pub authority: String,
}

#[derive(Serialize)]
pub struct BootstrapResponse {
    pub authority: CallerId,
}

#[derive(Serialize)]
pub struct SnapshotResponse {
    pub saved: bool,
    pub path: Option<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let (registered, verified) = state.core.directory.counts();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        clock: state.core.clock.now(),
        authority_set: state.core.authority.is_set(),
        registered_responders: registered,
        verified_responders: verified,
        policy: (*state.core.engine.policy()).clone(),
    })
}

/// Verified responders in verification order.
pub async fn get_responders(State(state): State<AppState>) -> Json<Vec<ResponderEntry>> {
    let directory = &state.core.directory;
    let entries = directory
        .verified_responders()
        .into_iter()
        .filter_map(|responder| {
            directory
                .location(&responder)
                .map(|location| ResponderEntry { responder, location })
        })
        .collect();
    Json(entries)
}

pub async fn get_alerts(State(state): State<AppState>) -> Json<RoutingSummary> {
    Json(state.core.engine.routing_summary())
}

/// One-time authority bootstrap for deployments started without one.
pub async fn bootstrap_authority(
    State(state): State<AppState>,
    Json(req): Json<BootstrapRequest>,
) -> Result<Json<BootstrapResponse>, ApiError> {
    let authority = CallerId::from(req.authority.trim());
    if authority.as_str().is_empty() {
        return Err(ApiError::BadRequest("authority must not be empty".into()));
    }
    state.core.authority.bootstrap(authority.clone())?;
    Ok(Json(BootstrapResponse { authority }))
}

pub async fn save_snapshot(State(state): State<AppState>) -> Result<Json<SnapshotResponse>, ApiError> {
    let path = state
        .core
        .save_snapshot()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(SnapshotResponse {
        saved: path.is_some(),
        path: path.map(|p| p.to_string_lossy().into_owned()),
    }))
}
