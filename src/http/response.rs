//! Error responses.
//!
//! Every failure leaves the API as `{"error": <code>, "message": <text>}`,
//! plus retry details for `no_responders`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::RoutingError;

/// An API-level failure.
#[derive(Debug)]
pub enum ApiError {
    /// Core operation rejected the call.
    Routing(RoutingError),
    /// Mutating call without `X-Caller-Id`.
    MissingCaller,
    /// Well-formed JSON with an unusable value.
    BadRequest(String),
    /// Failure outside the routing core (snapshot IO, etc).
    Internal(String),
}

impl From<RoutingError> for ApiError {
    fn from(err: RoutingError) -> Self {
        ApiError::Routing(err)
    }
}

/// HTTP status for each routing error.
pub fn status_for(err: &RoutingError) -> StatusCode {
    match err {
        RoutingError::NotFound(_) => StatusCode::NOT_FOUND,
        RoutingError::Unauthorized(_) => StatusCode::FORBIDDEN,
        RoutingError::InvalidLocation { .. } => StatusCode::BAD_REQUEST,
        RoutingError::NoResponders { .. } => StatusCode::NOT_FOUND,
        RoutingError::RegistryNotSet => StatusCode::SERVICE_UNAVAILABLE,
        RoutingError::AlreadyRouted(_) => StatusCode::CONFLICT,
        RoutingError::InvalidRadius(_) => StatusCode::BAD_REQUEST,
        RoutingError::MaxRoutingAttempts { .. } => StatusCode::CONFLICT,
        RoutingError::DistanceCalcFail => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Routing(err) => {
                let mut body = json!({
                    "error": err.code(),
                    "message": err.to_string(),
                });
                if let RoutingError::NoResponders { searched_radius, attempt_count, search_radius } = &err {
                    body["searched_radius"] = json!(searched_radius);
                    body["attempt_count"] = json!(attempt_count);
                    body["search_radius"] = json!(search_radius);
                }
                (status_for(&err), Json(body)).into_response()
            }
            ApiError::MissingCaller => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "missing_caller",
                    "message": "Missing X-Caller-Id header",
                })),
            )
                .into_response(),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "bad_request", "message": message })),
            )
                .into_response(),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal", "message": message })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&RoutingError::AlreadyRouted("a".into())), StatusCode::CONFLICT);
        assert_eq!(status_for(&RoutingError::RegistryNotSet), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(&RoutingError::Unauthorized("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&RoutingError::InvalidRadius(-1)), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_caller_is_401() {
        let response = ApiError::MissingCaller.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
