//! Unit Conversion Functions
//!
//! Speeds are reported in km/h, the chassis works in m/s.
//! - Speed: km/h ↔ m/s
//! - Angle: degrees ↔ radians

/// Convert m/s to km/h
pub fn ms_to_kmh(ms: f32) -> f32 {
    ms * 3.6
}

/// Convert km/h to m/s
pub fn kmh_to_ms(kmh: f32) -> f32 {
    kmh / 3.6
}

/// Convert degrees to radians
pub fn deg_to_rad(deg: f32) -> f32 {
    deg.to_radians()
}

/// Convert radians to degrees
pub fn rad_to_deg(rad: f32) -> f32 {
    rad.to_degrees()
}
