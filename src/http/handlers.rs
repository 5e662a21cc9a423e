//! Public API handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::directory::ResponderLocation;
use crate::error::RoutingError;
use crate::http::identity::{Caller, MaybeCaller};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::identity::{AlertId, CallerId, ResponderId};
use crate::routing::{AlertRouting, RouteAssignment};

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub lat: i64,
    pub long: i64,
}

#[derive(Debug, Serialize)]
pub struct ResponderView {
    pub responder: ResponderId,
    #[serde(flatten)]
    pub location: ResponderLocation,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub responder: ResponderId,
    pub verified: bool,
    /// False when the responder was already verified.
    pub newly_verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetAuthorityRequest {
    pub new_authority: String,
}

#[derive(Debug, Serialize)]
pub struct AuthorityView {
    pub authority: Option<CallerId>,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub lat: i64,
    pub long: i64,
    /// 0 or absent: reuse the stored radius, or the policy default.
    #[serde(default)]
    pub initial_radius: i64,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn register_location(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<LocationRequest>,
) -> Result<Json<ResponderView>, ApiError> {
    let now = state.core.clock.tick();
    let location = state
        .core
        .directory
        .register_location(&caller, req.lat, req.long, now)?;

    Ok(Json(ResponderView {
        responder: caller,
        location,
    }))
}

pub async fn get_responder(
    State(state): State<AppState>,
    Path(responder): Path<String>,
) -> Result<Json<ResponderView>, ApiError> {
    let responder = CallerId::from(responder.as_str());
    let location = state
        .core
        .directory
        .location(&responder)
        .ok_or_else(|| RoutingError::NotFound(responder.to_string()))?;

    Ok(Json(ResponderView { responder, location }))
}

pub async fn verify_responder(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(responder): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let responder = CallerId::from(responder.as_str());
    let now = state.core.clock.tick();
    let newly_verified = state.core.directory.verify(&caller, &responder, now)?;

    Ok(Json(VerifyResponse {
        responder,
        verified: true,
        newly_verified,
    }))
}

pub async fn get_authority(State(state): State<AppState>) -> Json<AuthorityView> {
    Json(AuthorityView {
        authority: state.core.authority.current(),
    })
}

pub async fn set_authority(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<SetAuthorityRequest>,
) -> Result<Json<AuthorityView>, ApiError> {
    let new_authority = CallerId::from(req.new_authority.trim());
    if new_authority.as_str().is_empty() {
        return Err(ApiError::BadRequest("new_authority must not be empty".into()));
    }
    state.core.directory.guard().set_authority(&caller, new_authority)?;

    Ok(Json(AuthorityView {
        authority: state.core.authority.current(),
    }))
}

pub async fn route_alert(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(alert_id): Path<String>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<RouteAssignment>, ApiError> {
    let alert_id = AlertId::new(alert_id);
    let assignment = state.core.engine.route_alert(
        &caller,
        &alert_id,
        req.lat,
        req.long,
        req.initial_radius,
        &state.core.clock,
    )?;
    Ok(Json(assignment))
}

pub async fn get_routing(
    State(state): State<AppState>,
    Path(alert_id): Path<String>,
) -> Result<Json<AlertRouting>, ApiError> {
    let alert_id = AlertId::new(alert_id);
    state
        .core
        .engine
        .get_routing(&alert_id)
        .map(Json)
        .ok_or_else(|| RoutingError::NotFound(alert_id.to_string()).into())
}

pub async fn reset_routing(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    Path(alert_id): Path<String>,
) -> Result<Json<AlertRouting>, ApiError> {
    let alert_id = AlertId::new(alert_id);
    tracing::info!(alert_id = %alert_id, caller = ?caller, "Routing reset requested");
    let removed = state.core.engine.reset_routing(&alert_id)?;
    Ok(Json(removed))
}
