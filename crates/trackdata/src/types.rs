//! Shared data model for both pipelines.
//!
//! The feature pipeline operates on [`ActivitySample`] sequences decoded from
//! device recordings; the enhancement pipeline consumes `Source*` structures
//! parsed from a vendor activity document and produces fully-populated
//! `Enhanced*` structures ready for serialization.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One per-second device reading plus its derived training features.
///
/// Created once per decoded record that carries a timestamp; records without
/// one are dropped at the ingestion boundary. Derived fields are filled in
/// place by the feature engineer and start out empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySample {
    /// Absolute device timestamp.
    pub timestamp: OffsetDateTime,
    /// Seconds elapsed since the first record of the activity.
    pub elapsed_seconds: i64,
    /// Heart rate in BPM. `None` after range-cleaning rejects the reading.
    pub heart_rate: Option<i32>,
    /// Instantaneous speed in m/s. `None` after range-cleaning rejects it.
    pub speed_mps: Option<f64>,
    /// Cumulative distance in meters.
    pub distance_m: Option<f64>,
    /// Altitude in meters.
    pub altitude_m: Option<f64>,
    /// Cadence in steps per minute.
    pub cadence_rpm: Option<i32>,
    /// Power in watts.
    pub power_watts: Option<i32>,
    /// Ambient temperature in degrees Celsius.
    pub temperature_c: Option<f64>,
    /// 1-based lap index assigned by lap time-window membership.
    pub lap_number: Option<u32>,
    /// Position converted from the device's semicircle encoding.
    pub position: Option<Position>,
    /// Features derived by the engineering passes.
    pub features: DerivedFeatures,
}

impl ActivitySample {
    /// Creates a bare sample with every optional field empty.
    pub fn new(timestamp: OffsetDateTime, elapsed_seconds: i64) -> Self {
        Self {
            timestamp,
            elapsed_seconds,
            heart_rate: None,
            speed_mps: None,
            distance_m: None,
            altitude_m: None,
            cadence_rpm: None,
            power_watts: None,
            temperature_c: None,
            lap_number: None,
            position: None,
            features: DerivedFeatures::default(),
        }
    }
}

/// Derived per-sample training features.
///
/// Zone and lag fields are only meaningful after the activity-wide pass:
/// they depend on aggregates (speed quartiles) or on neighbouring samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedFeatures {
    /// Pace in minutes per kilometer, from the cleaned speed.
    pub pace_min_per_km: Option<f64>,
    /// Signed grade percentage from altitude delta over horizontal distance.
    pub grade_percent: Option<f64>,
    /// Rate of elevation change in m/s.
    pub elevation_change_mps: Option<f64>,
    /// Heart-rate zone 1-5 against the activity maximum heart rate.
    pub hr_zone: Option<u8>,
    /// Activity-relative speed zone 1-4 by quartile bucket.
    pub speed_zone: Option<u8>,
    /// Heart rate five samples earlier.
    pub hr_lag_5s: Option<i32>,
    /// Heart rate ten samples earlier.
    pub hr_lag_10s: Option<i32>,
    /// Trailing rolling-average speed over the configured window.
    pub speed_smoothed: Option<f64>,
    /// Whether the grade exceeds the uphill threshold. `None` without grade.
    pub is_uphill: Option<bool>,
    /// Whether the speed exceeds the activity's 75th percentile.
    pub is_interval: Option<bool>,
}

/// A trackpoint as parsed from the source activity document.
///
/// Any field may be absent; the synthesizer guarantees the enhanced output
/// has a complete field set regardless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTrackpoint {
    pub time: Option<OffsetDateTime>,
    pub position: Option<Position>,
    pub altitude_m: Option<f64>,
    pub distance_m: Option<f64>,
    pub heart_rate: Option<i32>,
    pub cadence_rpm: Option<i32>,
}

/// A lap as parsed from the source activity document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceLap {
    pub start_time: Option<OffsetDateTime>,
    pub total_time_seconds: Option<f64>,
    pub distance_m: Option<f64>,
    pub calories: Option<u32>,
    pub average_heart_rate: Option<i32>,
    pub maximum_heart_rate: Option<i32>,
    pub intensity: Option<String>,
    pub trigger_method: Option<String>,
    pub trackpoints: Vec<SourceTrackpoint>,
}

impl SourceLap {
    /// Mean heart rate over all trackpoints, counting missing readings as
    /// zero. Returns 0 for an empty lap.
    pub fn mean_heart_rate(&self) -> f64 {
        if self.trackpoints.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .trackpoints
            .iter()
            .map(|tp| f64::from(tp.heart_rate.unwrap_or(0)))
            .sum();
        sum / self.trackpoints.len() as f64
    }
}

/// A source activity: one sport session with its laps.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceActivity {
    pub id: String,
    pub sport: String,
    pub laps: Vec<SourceLap>,
}

/// A fully-populated trackpoint produced by the synthesizer.
///
/// `speed_mps` and `cadence_rpm` are carried in the document's extension
/// block on serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedTrackpoint {
    pub time: OffsetDateTime,
    pub position: Position,
    pub altitude_m: f64,
    /// Cumulative distance within the lap, post-scaling.
    pub distance_m: f64,
    pub heart_rate: Option<i32>,
    /// Synthesized instantaneous speed, post-scaling.
    pub speed_mps: f64,
    /// Synthesized cadence from the post-scale speed.
    pub cadence_rpm: i32,
}

/// A lap with a synthesized track and recomputed aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedLap {
    pub start_time: OffsetDateTime,
    pub total_time_seconds: f64,
    /// The distance allocated to this lap; the track's final cumulative
    /// distance matches it exactly.
    pub distance_m: f64,
    pub maximum_speed_mps: f64,
    pub calories: u32,
    pub average_heart_rate: i32,
    pub maximum_heart_rate: i32,
    pub intensity: String,
    pub trigger_method: String,
    /// Mean synthesized cadence over the lap, rounded.
    pub cadence_rpm: i32,
    pub trackpoints: Vec<EnhancedTrackpoint>,
}

/// The rebuilt activity ready for target-format serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedActivity {
    pub id: String,
    pub sport: String,
    pub laps: Vec<EnhancedLap>,
}

impl EnhancedActivity {
    /// Sum of all lap distances in meters.
    pub fn total_distance_m(&self) -> f64 {
        self.laps.iter().map(|lap| lap.distance_m).sum()
    }
}
