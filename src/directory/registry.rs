//! Responder directory: locations, verification and radius queries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::authority::AuthorizationGuard;
use crate::directory::responder::{Candidate, ResponderLocation};
use crate::error::{RoutingError, RoutingResult};
use crate::geo::{self, GeoPoint};
use crate::identity::{CallerId, ResponderId};
use crate::observability::metrics;

#[derive(Debug, Default)]
struct DirectoryState {
    locations: HashMap<ResponderId, ResponderLocation>,
    /// Responders in the order they were verified.
    verified_index: Vec<ResponderId>,
}

/// Serializable copy of the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub responders: BTreeMap<ResponderId, ResponderLocation>,
    pub verified_index: Vec<ResponderId>,
}

/// Owns every responder record and the verified index.
#[derive(Debug)]
pub struct ResponderDirectory {
    state: RwLock<DirectoryState>,
    guard: AuthorizationGuard,
}

impl ResponderDirectory {
    /// Create an empty directory whose verification is gated by `guard`.
    pub fn new(guard: AuthorizationGuard) -> Self {
        Self {
            state: RwLock::new(DirectoryState::default()),
            guard,
        }
    }

    pub fn guard(&self) -> &AuthorizationGuard {
        &self.guard
    }

    /// Create or update the caller's own location.
    ///
    /// The verified flag of an existing record is preserved.
    pub fn register_location(
        &self,
        caller: &CallerId,
        lat: i64,
        long: i64,
        now: u64,
    ) -> RoutingResult<ResponderLocation> {
        if !geo::validate(lat, long) {
            tracing::warn!(responder = %caller, lat, long, "Rejected out-of-bounds location");
            return Err(RoutingError::InvalidLocation { lat, long });
        }

        let mut state = self.state.write().expect("directory lock poisoned");
        let verified = state
            .locations
            .get(caller)
            .map(|existing| existing.verified)
            .unwrap_or(false);

        let record = ResponderLocation {
            lat,
            long,
            verified,
            last_updated: now,
        };
        state.locations.insert(caller.clone(), record.clone());
        metrics::record_registered_responders(state.locations.len());

        tracing::debug!(responder = %caller, lat, long, verified, "Responder location registered");
        Ok(record)
    }

    /// Mark `responder` as verified. Only the registry authority may call this.
    ///
    /// Returns `true` if the responder was newly verified, `false` if it
    /// already was (no change).
    pub fn verify(&self, caller: &CallerId, responder: &ResponderId, now: u64) -> RoutingResult<bool> {
        if !self.guard.require_authority(caller) {
            tracing::warn!(caller = %caller, responder = %responder, "Unauthorized verification attempt");
            return Err(RoutingError::Unauthorized(caller.to_string()));
        }

        let mut state = self.state.write().expect("directory lock poisoned");
        let record = state
            .locations
            .get_mut(responder)
            .ok_or_else(|| RoutingError::NotFound(responder.to_string()))?;

        if record.verified {
            return Ok(false);
        }
        record.verified = true;
        record.last_updated = now;
        state.verified_index.push(responder.clone());
        metrics::record_verified_responders(state.verified_index.len());

        tracing::info!(responder = %responder, authority = %caller, "Responder verified");
        Ok(true)
    }

    /// Verified responders within `radius` meters of the center, with their
    /// distances, in verification order.
    pub fn candidates_in_radius(&self, center: GeoPoint, radius: i64) -> RoutingResult<Vec<Candidate>> {
        let state = self.state.read().expect("directory lock poisoned");
        let mut candidates = Vec::new();

        for responder in &state.verified_index {
            let Some(record) = state.locations.get(responder) else {
                continue;
            };
            if !record.verified {
                continue;
            }
            let distance = geo::distance_between(center, record.point())?;
            if radius >= 0 && distance <= radius as u64 {
                candidates.push(Candidate {
                    responder: responder.clone(),
                    distance,
                });
            }
        }

        Ok(candidates)
    }

    /// Identities of verified responders within `radius` meters of the center.
    pub fn query_verified_in_radius(
        &self,
        center_lat: i64,
        center_long: i64,
        radius: i64,
    ) -> RoutingResult<Vec<ResponderId>> {
        let candidates = self.candidates_in_radius(GeoPoint::new(center_lat, center_long), radius)?;
        Ok(candidates.into_iter().map(|c| c.responder).collect())
    }

    pub fn location(&self, responder: &ResponderId) -> Option<ResponderLocation> {
        self.state
            .read()
            .expect("directory lock poisoned")
            .locations
            .get(responder)
            .cloned()
    }

    /// Verified responders in verification order.
    pub fn verified_responders(&self) -> Vec<ResponderId> {
        self.state
            .read()
            .expect("directory lock poisoned")
            .verified_index
            .clone()
    }

    /// (registered, verified) responder counts.
    pub fn counts(&self) -> (usize, usize) {
        let state = self.state.read().expect("directory lock poisoned");
        (state.locations.len(), state.verified_index.len())
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        let state = self.state.read().expect("directory lock poisoned");
        DirectorySnapshot {
            responders: state
                .locations
                .iter()
                .map(|(id, record)| (id.clone(), record.clone()))
                .collect(),
            verified_index: state.verified_index.clone(),
        }
    }

    /// Replace the directory contents with a snapshot.
    ///
    /// Index entries without a verified record are dropped so the index
    /// never names an unverified responder.
    pub fn restore(&self, snapshot: DirectorySnapshot) {
        let mut state = self.state.write().expect("directory lock poisoned");
        let locations: HashMap<_, _> = snapshot.responders.into_iter().collect();

        let mut verified_index = Vec::with_capacity(snapshot.verified_index.len());
        for responder in snapshot.verified_index {
            let is_verified = locations.get(&responder).is_some_and(|r| r.verified);
            if is_verified && !verified_index.contains(&responder) {
                verified_index.push(responder);
            } else {
                tracing::warn!(responder = %responder, "Dropping stale verified index entry");
            }
        }

        state.locations = locations;
        state.verified_index = verified_index;
        metrics::record_registered_responders(state.locations.len());
        metrics::record_verified_responders(state.verified_index.len());
    }
}
