//! Environment configuration for the binaries.
//!
//! All recognized options have defaults. Values are read once at startup
//! and threaded into the core as explicit configuration objects; nothing
//! deeper in the pipelines touches the process environment.

use std::str::FromStr;

use trackdata::config::{FeatureConfig, SynthesisConfig};

const METERS_PER_MILE: f64 = 1609.344;

/// Reads a string option with a default.
pub fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Reads and parses an option, ignoring unset or unparseable values.
fn parsed<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
}

/// Converts a distance override given in miles to meters.
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Synthesis configuration with environment overrides applied.
///
/// Recognized: `DISTANCE` (miles), `MAX_HR`, `LATITUDE`, `LONGITUDE`,
/// `ALTITUDE`.
pub fn synthesis_config_from_env() -> SynthesisConfig {
    let mut config = SynthesisConfig::default();
    if let Some(miles) = parsed::<f64>("DISTANCE") {
        config.total_distance_m = miles_to_meters(miles);
    }
    if let Some(max_hr) = parsed::<f64>("MAX_HR") {
        config.speed.max_hr = max_hr;
    }
    if let Some(latitude) = parsed::<f64>("LATITUDE") {
        config.arena.center_latitude = latitude;
    }
    if let Some(longitude) = parsed::<f64>("LONGITUDE") {
        config.arena.center_longitude = longitude;
    }
    if let Some(altitude) = parsed::<f64>("ALTITUDE") {
        config.arena.center_altitude_m = altitude;
    }
    config
}

/// Feature configuration with environment overrides applied.
///
/// Recognized: `MAX_HR` for the heart-rate zone ceiling fallback.
pub fn feature_config_from_env() -> FeatureConfig {
    let mut config = FeatureConfig::default();
    if let Some(max_hr) = parsed::<f64>("MAX_HR") {
        config.max_hr_zone = max_hr;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miles_to_meters() {
        assert!((miles_to_meters(6.0) - 9656.064).abs() < 1e-9);
        assert!((miles_to_meters(1.0) - 1609.344).abs() < 1e-9);
    }
}
