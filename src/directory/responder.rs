//! Responder records.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::identity::ResponderId;

/// A responder's last reported location and verification state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderLocation {
    /// Latitude, degrees × 1e7.
    pub lat: i64,
    /// Longitude, degrees × 1e7.
    pub long: i64,
    /// Set once by the authority; never cleared.
    pub verified: bool,
    /// Logical time of the last write.
    pub last_updated: u64,
}

impl ResponderLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.long)
    }
}

/// A verified responder found inside a search radius.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub responder: ResponderId,
    /// Distance to the search center in meters.
    pub distance: u64,
}
