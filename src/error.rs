//! Error definitions for the routing core.

use thiserror::Error;

/// Errors returned by directory, authority and routing operations.
///
/// Every guard failure is returned before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Responder or alert record does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Caller does not hold the registry authority.
    #[error("Caller {0} is not authorized")]
    Unauthorized(String),

    /// Coordinates fall outside the legal latitude/longitude bounds.
    #[error("Invalid location: lat={lat}, long={long}")]
    InvalidLocation { lat: i64, long: i64 },

    /// No verified responder inside the searched radius.
    /// The alert now carries `attempt_count` failures and will search `search_radius` next.
    #[error("No verified responders within {searched_radius} m (attempt {attempt_count}, next radius {search_radius} m)")]
    NoResponders {
        searched_radius: i64,
        attempt_count: u32,
        search_radius: i64,
    },

    /// The registry authority has never been configured.
    #[error("Registry authority is not set")]
    RegistryNotSet,

    /// Alert already has a responder assigned.
    #[error("Alert {0} is already routed")]
    AlreadyRouted(String),

    /// Search radius is negative or resolves to zero.
    #[error("Invalid search radius: {0}")]
    InvalidRadius(i64),

    /// Alert has used its whole attempt budget.
    #[error("Alert {alert_id} exhausted {max_attempts} routing attempts")]
    MaxRoutingAttempts { alert_id: String, max_attempts: u32 },

    /// Geometry that cannot be represented as a distance in meters.
    #[error("Distance calculation failed")]
    DistanceCalcFail,
}

impl RoutingError {
    /// Stable identifier used in API error bodies and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            RoutingError::NotFound(_) => "not_found",
            RoutingError::Unauthorized(_) => "unauthorized",
            RoutingError::InvalidLocation { .. } => "invalid_location",
            RoutingError::NoResponders { .. } => "no_responders",
            RoutingError::RegistryNotSet => "registry_not_set",
            RoutingError::AlreadyRouted(_) => "already_routed",
            RoutingError::InvalidRadius(_) => "invalid_radius",
            RoutingError::MaxRoutingAttempts { .. } => "max_routing_attempts",
            RoutingError::DistanceCalcFail => "distance_calc_fail",
        }
    }
}

/// Result type for routing core operations.
pub type RoutingResult<T> = Result<T, RoutingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RoutingError::NoResponders {
            searched_radius: 50_000,
            attempt_count: 1,
            search_radius: 100_000,
        };
        assert!(err.to_string().contains("50000"));
        assert!(err.to_string().contains("100000"));

        let err = RoutingError::MaxRoutingAttempts {
            alert_id: "a-1".into(),
            max_attempts: 5,
        };
        assert_eq!(err.to_string(), "Alert a-1 exhausted 5 routing attempts");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(RoutingError::RegistryNotSet.code(), "registry_not_set");
        assert_eq!(RoutingError::InvalidRadius(-1).code(), "invalid_radius");
        assert_eq!(RoutingError::DistanceCalcFail.code(), "distance_calc_fail");
    }
}
