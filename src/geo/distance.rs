//! Great-circle distance estimation.
//!
//! Haversine on `f64`, rounded to the nearest whole meter. Results agree
//! within a process; across platforms they may differ by at most one meter
//! where the unrounded value sits on a half-meter boundary.

use crate::error::{RoutingError, RoutingResult};
use crate::geo::{GeoPoint, COORDINATE_SCALE};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Distance between two fixed-point coordinates, in whole meters.
///
/// Identical points always yield exactly 0.
pub fn distance(lat1: i64, long1: i64, lat2: i64, long2: i64) -> RoutingResult<u64> {
    if lat1 == lat2 && long1 == long2 {
        return Ok(0);
    }

    let lat1_rad = (lat1 as f64 / COORDINATE_SCALE).to_radians();
    let lat2_rad = (lat2 as f64 / COORDINATE_SCALE).to_radians();
    let delta_lat = ((lat2 as f64 - lat1 as f64) / COORDINATE_SCALE).to_radians();
    let delta_long = ((long2 as f64 - long1 as f64) / COORDINATE_SCALE).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_long / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    let meters = (EARTH_RADIUS_METERS * c).round();
    if !meters.is_finite() || meters < 0.0 || meters > u64::MAX as f64 {
        return Err(RoutingError::DistanceCalcFail);
    }
    Ok(meters as u64)
}

/// Distance between two points, in whole meters.
pub fn distance_between(a: GeoPoint, b: GeoPoint) -> RoutingResult<u64> {
    distance(a.lat, a.long, b.lat, b.long)
}
