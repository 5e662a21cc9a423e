//! Geographic primitives.
//!
//! # Data Flow
//! ```text
//! (lat, long) scaled by 1e7
//!     → validator.rs (bounds check)
//!     → distance.rs (haversine, whole meters)
//! ```
//!
//! # Design Decisions
//! - Coordinates stay fixed-point integers everywhere outside distance.rs
//! - Floating point is confined to one function, rounded before it escapes

pub mod distance;
pub mod validator;

use serde::{Deserialize, Serialize};

/// Fixed-point scale of stored coordinates (degrees × 10,000,000).
pub const COORDINATE_SCALE: f64 = 10_000_000.0;

/// A latitude/longitude pair in fixed-point degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: i64,
    pub long: i64,
}

impl GeoPoint {
    pub fn new(lat: i64, long: i64) -> Self {
        Self { lat, long }
    }

    /// Build a point from floating degrees, rounding to the fixed-point grid.
    pub fn from_degrees(lat: f64, long: f64) -> Self {
        Self {
            lat: (lat * COORDINATE_SCALE).round() as i64,
            long: (long * COORDINATE_SCALE).round() as i64,
        }
    }
}

pub use distance::distance_between;
pub use validator::validate;
