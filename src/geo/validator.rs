//! Coordinate bounds check.

/// Largest legal latitude magnitude (90° scaled by 1e7).
pub const MAX_LAT: i64 = 900_000_000;

/// Largest legal longitude magnitude (180° scaled by 1e7).
pub const MAX_LONG: i64 = 1_800_000_000;

/// Returns true when `lat` and `long` both lie within their legal range.
pub fn validate(lat: i64, long: i64) -> bool {
    (-MAX_LAT..=MAX_LAT).contains(&lat) && (-MAX_LONG..=MAX_LONG).contains(&long)
}
