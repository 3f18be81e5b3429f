//! Configuration types for synthesis and feature engineering.
//!
//! Every tunable the algorithms consult lives here, threaded explicitly into
//! the entry points. Nothing in this crate reads ambient process state.

use serde::{Deserialize, Serialize};

/// Parameters of the heart-rate to speed model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedModelConfig {
    /// Resting heart rate in BPM, the baseline for lap effort levels.
    pub resting_hr: f64,
    /// Maximum heart rate in BPM.
    pub max_hr: f64,
    /// Below this heart rate the athlete is assumed off the field.
    pub floor_hr: f64,
    /// Top sprint speed in m/s.
    pub max_speed_mps: f64,
    /// Walking speed in m/s, the output at the floor heart rate.
    pub min_active_speed_mps: f64,
    /// Multiplicative noise amplitude, 0-1.
    pub speed_variability: f64,
}

impl Default for SpeedModelConfig {
    fn default() -> Self {
        Self {
            resting_hr: 60.0,
            max_hr: 196.0,
            floor_hr: 100.0,
            max_speed_mps: 8.5,  // ~19 mph sprint
            min_active_speed_mps: 1.5, // ~3.4 mph walk
            speed_variability: 0.3,
        }
    }
}

/// Shape of the playing arena the simulated athlete stays within.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ArenaShape {
    /// Axis-aligned box centred on the arena centre.
    Rectangle { width_m: f64, height_m: f64 },
    /// Great-circle disc around the arena centre.
    Circle { radius_m: f64 },
}

/// Where the motion simulator operates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub center_latitude: f64,
    pub center_longitude: f64,
    /// Base altitude in meters, also the base for the altitude fallback.
    pub center_altitude_m: f64,
    pub shape: ArenaShape,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            center_latitude: 44.970814,
            center_longitude: -93.292994,
            center_altitude_m: 252.0,
            shape: ArenaShape::Rectangle {
                width_m: 70.0,
                height_m: 100.0,
            },
        }
    }
}

/// Configuration for the enhancement pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Target distance for the whole activity in meters, split across laps.
    pub total_distance_m: f64,
    /// Amplitude of the sinusoidal altitude fallback in meters.
    pub altitude_amplitude_m: f64,
    pub speed: SpeedModelConfig,
    pub arena: ArenaConfig,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            total_distance_m: 9656.06, // ~6 miles
            altitude_amplitude_m: 10.0,
            speed: SpeedModelConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}

/// Configuration for the per-sample feature pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Heart rates below this are nulled by the cleaner.
    pub min_heart_rate: f64,
    /// Heart rates above this are nulled by the cleaner.
    pub max_heart_rate: f64,
    /// Fallback activity maximum heart rate for zone assignment when the
    /// recording carries none.
    pub max_hr_zone: f64,
    /// Speeds below this are nulled by the cleaner.
    pub min_speed_mps: f64,
    /// Speeds above this are nulled by the cleaner.
    pub max_speed_mps: f64,
    /// Trailing window for the rolling speed average, in seconds.
    pub smoothing_window_seconds: usize,
    /// Grade percentage above which a sample counts as uphill.
    pub grade_threshold: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_heart_rate: 60.0,
            max_heart_rate: 220.0,
            max_hr_zone: 220.0,
            min_speed_mps: 0.5,
            max_speed_mps: 15.0,
            smoothing_window_seconds: 10,
            grade_threshold: 2.0,
        }
    }
}
