//! Unit conversions between provider-native measurements and dashboard units.
//!
//! These are plain linear conversions. Nothing here rounds or validates:
//! negative, infinite or NaN inputs come back converted the same way, and
//! rounding for display is left to whoever renders the value.

// ---

const KMH_PER_MS: f64 = 3.6;
const METERS_PER_KM: f64 = 1000.0;

/// Meters per second to kilometers per hour.
pub fn ms_to_kmh(v: f64) -> f64 {
    v * KMH_PER_MS
}

/// Kilometers per hour to meters per second.
pub fn kmh_to_ms(v: f64) -> f64 {
    v / KMH_PER_MS
}

/// Meters to kilometers.
pub fn meters_to_km(v: f64) -> f64 {
    v / METERS_PER_KM
}

/// Kilometers to meters.
pub fn km_to_meters(v: f64) -> f64 {
    v * METERS_PER_KM
}
