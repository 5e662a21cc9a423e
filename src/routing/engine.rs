//! The bounded-retry routing state machine.

use arc_swap::ArcSwap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::clock::LogicalClock;
use crate::config::RoutingConfig;
use crate::directory::ResponderDirectory;
use crate::error::{RoutingError, RoutingResult};
use crate::geo::{self, GeoPoint};
use crate::identity::{AlertId, CallerId};
use crate::observability::metrics;
use crate::routing::selector::nearest;
use crate::routing::types::{AlertRouting, RouteAssignment};

/// Owns per-alert routing records and assigns alerts to responders.
#[derive(Debug)]
pub struct RoutingEngine {
    directory: Arc<ResponderDirectory>,
    pub(crate) alerts: DashMap<AlertId, AlertRouting>,
    policy: ArcSwap<RoutingConfig>,
}

impl RoutingEngine {
    pub fn new(directory: Arc<ResponderDirectory>, policy: RoutingConfig) -> Self {
        Self {
            directory,
            alerts: DashMap::new(),
            policy: ArcSwap::from_pointee(policy),
        }
    }

    pub fn directory(&self) -> &Arc<ResponderDirectory> {
        &self.directory
    }

    /// Current routing policy.
    pub fn policy(&self) -> Arc<RoutingConfig> {
        self.policy.load_full()
    }

    /// Swap in a new policy. Takes effect for subsequent calls.
    pub fn update_policy(&self, policy: RoutingConfig) {
        tracing::info!(
            max_attempts = policy.max_attempts,
            default_search_radius_m = policy.default_search_radius_m,
            "Routing policy updated"
        );
        self.policy.store(Arc::new(policy));
    }

    /// Try to assign `alert_id` to the nearest verified responder.
    ///
    /// `initial_radius` of 0 reuses the stored radius (or the policy default
    /// for a new alert). On `NoResponders` the alert's attempt count and
    /// doubled radius are persisted so the next call continues the search.
    ///
    /// The clock is ticked only when a record is written, while the alert's
    /// entry is held, so stored timestamps follow write order.
    pub fn route_alert(
        &self,
        caller: &CallerId,
        alert_id: &AlertId,
        lat: i64,
        long: i64,
        initial_radius: i64,
        clock: &LogicalClock,
    ) -> RoutingResult<RouteAssignment> {
        let started = Instant::now();
        let result = self.try_route(caller, alert_id, lat, long, initial_radius, clock);

        match &result {
            Ok(assignment) => {
                metrics::record_route_distance(assignment.distance);
                tracing::info!(
                    alert_id = %alert_id,
                    responder = %assignment.responder,
                    distance_m = assignment.distance,
                    radius_m = assignment.search_radius,
                    "Alert routed"
                );
            }
            Err(RoutingError::NoResponders { searched_radius, attempt_count, .. }) => {
                tracing::debug!(
                    alert_id = %alert_id,
                    searched_radius_m = searched_radius,
                    attempt_count,
                    "No responders in radius"
                );
            }
            Err(e) => {
                tracing::warn!(alert_id = %alert_id, caller = %caller, error = %e, "Routing rejected");
            }
        }
        metrics::record_route_attempt(
            result.as_ref().map_or_else(|e| e.code(), |_| "routed"),
            started,
        );

        result
    }

    fn try_route(
        &self,
        _caller: &CallerId,
        alert_id: &AlertId,
        lat: i64,
        long: i64,
        initial_radius: i64,
        clock: &LogicalClock,
    ) -> RoutingResult<RouteAssignment> {
        if initial_radius < 0 {
            return Err(RoutingError::InvalidRadius(initial_radius));
        }

        let policy = self.policy.load();

        // Held until the new record is written: calls for one alert never interleave.
        let entry = self.alerts.entry(alert_id.clone());
        let existing = match &entry {
            Entry::Occupied(occupied) => Some(occupied.get().clone()),
            Entry::Vacant(_) => None,
        };

        if !self.directory.guard().registry_configured() {
            return Err(RoutingError::RegistryNotSet);
        }

        if existing.as_ref().is_some_and(AlertRouting::is_routed) {
            return Err(RoutingError::AlreadyRouted(alert_id.to_string()));
        }

        let attempt_count = existing.as_ref().map_or(0, |r| r.attempt_count);
        if attempt_count >= policy.max_attempts {
            return Err(RoutingError::MaxRoutingAttempts {
                alert_id: alert_id.to_string(),
                max_attempts: policy.max_attempts,
            });
        }

        let search_radius = if initial_radius > 0 {
            initial_radius
        } else {
            existing
                .as_ref()
                .map_or(policy.default_search_radius_m, |r| r.search_radius)
        };
        if search_radius <= 0 {
            return Err(RoutingError::InvalidRadius(search_radius));
        }

        if !geo::validate(lat, long) {
            return Err(RoutingError::InvalidLocation { lat, long });
        }

        let candidates = self
            .directory
            .candidates_in_radius(GeoPoint::new(lat, long), search_radius)?;

        let now = clock.tick();
        match nearest(&candidates) {
            Some(best) => {
                entry.insert(AlertRouting {
                    alert_id: alert_id.clone(),
                    routed_to: Some(best.responder.clone()),
                    distance: best.distance,
                    timestamp: now,
                    attempt_count: 0,
                    search_radius,
                });
                Ok(RouteAssignment {
                    alert_id: alert_id.clone(),
                    responder: best.responder,
                    distance: best.distance,
                    search_radius,
                    timestamp: now,
                })
            }
            None => {
                let attempt_count = attempt_count + 1;
                let next_radius = search_radius.saturating_mul(2);
                entry.insert(AlertRouting {
                    alert_id: alert_id.clone(),
                    routed_to: None,
                    distance: 0,
                    timestamp: now,
                    attempt_count,
                    search_radius: next_radius,
                });
                Err(RoutingError::NoResponders {
                    searched_radius: search_radius,
                    attempt_count,
                    search_radius: next_radius,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{AuthorizationGuard, RegistryAuthority};

    const ROOT: &str = "root";

    fn engine_with_authority(authority: Option<&str>) -> RoutingEngine {
        let authority = Arc::new(RegistryAuthority::new(authority.map(CallerId::from)));
        let directory = Arc::new(ResponderDirectory::new(AuthorizationGuard::new(authority)));
        RoutingEngine::new(directory, RoutingConfig::default())
    }

    fn engine() -> RoutingEngine {
        engine_with_authority(Some(ROOT))
    }

    fn add_verified(engine: &RoutingEngine, id: &str, lat: f64, long: f64) {
        let point = GeoPoint::from_degrees(lat, long);
        let id = CallerId::from(id);
        let dir = engine.directory();
        dir.register_location(&id, point.lat, point.long, 1).unwrap();
        dir.verify(&CallerId::from(ROOT), &id, 1).unwrap();
    }

    /// Route with a clock whose next tick is `now`.
    fn route(engine: &RoutingEngine, alert: &str, lat: f64, long: f64, radius: i64, now: u64) -> RoutingResult<RouteAssignment> {
        route_with_clock(engine, alert, lat, long, radius, &LogicalClock::new(now.saturating_sub(1)))
    }

    fn route_with_clock(
        engine: &RoutingEngine,
        alert: &str,
        lat: f64,
        long: f64,
        radius: i64,
        clock: &LogicalClock,
    ) -> RoutingResult<RouteAssignment> {
        let point = GeoPoint::from_degrees(lat, long);
        engine.route_alert(&CallerId::from("dispatcher"), &AlertId::from(alert), point.lat, point.long, radius, clock)
    }

    #[test]
    fn test_routes_to_nearer_responder() {
        let engine = engine();
        add_verified(&engine, "A", 40.0, -74.0);
        add_verified(&engine, "B", 40.02, -73.98);

        let assignment = route(&engine, "alert-1", 40.01, -73.99, 100_000, 7).unwrap();
        assert_eq!(assignment.responder, CallerId::from("A"));
        assert_eq!(assignment.distance, 1401);

        let record = engine.get_routing(&AlertId::from("alert-1")).unwrap();
        assert_eq!(record.routed_to, Some(CallerId::from("A")));
        assert_eq!(record.attempt_count, 0);
        assert_eq!(record.search_radius, 100_000);
        assert_eq!(record.timestamp, 7);
    }

    #[test]
    fn test_routed_alert_is_terminal() {
        let engine = engine();
        add_verified(&engine, "A", 40.0, -74.0);
        route(&engine, "alert-1", 40.01, -73.99, 0, 3).unwrap();
        let before = engine.get_routing(&AlertId::from("alert-1")).unwrap();

        add_verified(&engine, "closer", 40.01, -73.99);
        let err = route(&engine, "alert-1", 40.01, -73.99, 0, 9).unwrap_err();
        assert_eq!(err, RoutingError::AlreadyRouted("alert-1".into()));
        assert_eq!(engine.get_routing(&AlertId::from("alert-1")).unwrap(), before);
    }

    #[test]
    fn test_radius_escalation_and_attempt_ceiling() {
        let engine = engine();
        // Far away from the alert: never inside any radius used below.
        add_verified(&engine, "far", -40.0, 100.0);

        let mut expected_radius = 1_000;
        for attempt in 1..=5u32 {
            let radius = if attempt == 1 { 1_000 } else { 0 };
            let err = route(&engine, "alert-1", 40.0, -74.0, radius, attempt as u64).unwrap_err();
            assert_eq!(
                err,
                RoutingError::NoResponders {
                    searched_radius: expected_radius,
                    attempt_count: attempt,
                    search_radius: expected_radius * 2,
                }
            );
            expected_radius *= 2;

            let record = engine.get_routing(&AlertId::from("alert-1")).unwrap();
            assert_eq!(record.attempt_count, attempt);
            assert_eq!(record.search_radius, expected_radius);
            assert_eq!(record.distance, 0);
        }

        let before = engine.get_routing(&AlertId::from("alert-1")).unwrap();
        let err = route(&engine, "alert-1", 40.0, -74.0, 0, 99).unwrap_err();
        assert_eq!(
            err,
            RoutingError::MaxRoutingAttempts {
                alert_id: "alert-1".into(),
                max_attempts: 5,
            }
        );
        let after = engine.get_routing(&AlertId::from("alert-1")).unwrap();
        assert_eq!(after, before);
        assert_eq!(after.search_radius, 32_000);
        assert_eq!(after.timestamp, 5);
    }

    #[test]
    fn test_retry_after_new_responder_resets_attempts() {
        let engine = engine();
        add_verified(&engine, "far", 45.0, -74.0);

        let err = route(&engine, "alert-1", 40.0, -74.0, 0, 1).unwrap_err();
        assert!(matches!(err, RoutingError::NoResponders { attempt_count: 1, search_radius: 100_000, .. }));

        add_verified(&engine, "close", 40.1, -74.0);
        let assignment = route(&engine, "alert-1", 40.0, -74.0, 0, 2).unwrap();
        assert_eq!(assignment.responder, CallerId::from("close"));
        assert_eq!(assignment.search_radius, 100_000);

        let record = engine.get_routing(&AlertId::from("alert-1")).unwrap();
        assert_eq!(record.attempt_count, 0);
        assert_eq!(record.search_radius, 100_000);
    }

    #[test]
    fn test_guards_do_not_write() {
        let engine = engine();
        let alert = AlertId::from("alert-1");

        assert_eq!(
            route(&engine, "alert-1", 40.0, -74.0, -5, 1).unwrap_err(),
            RoutingError::InvalidRadius(-5)
        );
        assert!(engine.get_routing(&alert).is_none());

        let err = engine
            .route_alert(&CallerId::from("d"), &alert, 1_000_000_000, 0, 0, &LogicalClock::default())
            .unwrap_err();
        assert_eq!(err, RoutingError::InvalidLocation { lat: 1_000_000_000, long: 0 });
        assert!(engine.get_routing(&alert).is_none());
    }

    #[test]
    fn test_registry_not_set() {
        let engine = engine_with_authority(None);
        let err = route(&engine, "alert-1", 40.0, -74.0, 0, 1).unwrap_err();
        assert_eq!(err, RoutingError::RegistryNotSet);
        assert!(engine.get_routing(&AlertId::from("alert-1")).is_none());
    }

    #[test]
    fn test_unverified_responders_are_ignored() {
        let engine = engine();
        let point = GeoPoint::from_degrees(40.0, -74.0);
        engine
            .directory()
            .register_location(&CallerId::from("pending"), point.lat, point.long, 1)
            .unwrap();

        let err = route(&engine, "alert-1", 40.0, -74.0, 0, 2).unwrap_err();
        assert!(matches!(err, RoutingError::NoResponders { .. }));
    }

    #[test]
    fn test_policy_update_applies_to_next_call() {
        let engine = engine();
        engine.update_policy(RoutingConfig {
            max_attempts: 1,
            default_search_radius_m: 10,
        });

        let err = route(&engine, "alert-1", 40.0, -74.0, 0, 1).unwrap_err();
        assert!(matches!(err, RoutingError::NoResponders { searched_radius: 10, .. }));
        let err = route(&engine, "alert-1", 40.0, -74.0, 0, 2).unwrap_err();
        assert!(matches!(err, RoutingError::MaxRoutingAttempts { max_attempts: 1, .. }));
    }

    #[test]
    fn test_rejected_calls_do_not_tick_clock() {
        let engine = engine();
        let clock = LogicalClock::new(0);

        let err = route_with_clock(&engine, "alert-1", 40.0, -74.0, -1, &clock).unwrap_err();
        assert_eq!(err, RoutingError::InvalidRadius(-1));
        assert_eq!(clock.now(), 0);

        route_with_clock(&engine, "alert-1", 40.0, -74.0, 0, &clock).unwrap_err();
        assert_eq!(clock.now(), 1);
    }

    #[test]
    fn test_concurrent_routing_of_one_alert() {
        let engine = Arc::new(engine());
        let clock = Arc::new(LogicalClock::new(0));
        add_verified(&engine, "far", -40.0, 100.0);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                let clock = clock.clone();
                std::thread::spawn(move || route_with_clock(&engine, "alert-1", 40.0, -74.0, 0, &clock))
            })
            .collect();
        for handle in handles {
            let _ = handle.join().unwrap();
        }

        // Five attempts were recorded; the remaining three hit the ceiling.
        let record = engine.get_routing(&AlertId::from("alert-1")).unwrap();
        assert_eq!(record.attempt_count, 5);
        assert_eq!(record.search_radius, 50_000 * 32);
        // Ticks are taken under the alert's entry, so the last write holds the latest time.
        assert_eq!(clock.now(), 5);
        assert_eq!(record.timestamp, 5);
    }
}
