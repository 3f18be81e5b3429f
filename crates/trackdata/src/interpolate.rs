//! Stateless fallback generators for missing trackpoint fields.
//!
//! Used only when the source record lacks a field; together with the motion
//! simulator they guarantee every synthesized trackpoint has a complete
//! field set even from degenerate input.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use time::{Duration, OffsetDateTime};

/// Assumed constant speed for the index-linear distance fallback, in m/s.
const ASSUMED_SPEED_MPS: f64 = 3.0;

/// Heart rate the fallback oscillates around, in BPM.
const BASE_HEART_RATE: f64 = 140.0;

/// Timestamp for the `index`-th sample, assuming uniform 1 Hz sampling.
pub fn fallback_time(base: OffsetDateTime, index: usize) -> OffsetDateTime {
    base + Duration::seconds(index as i64)
}

/// Gentle sinusoidal elevation around the base altitude.
pub fn fallback_altitude(index: usize, base_m: f64, amplitude_m: f64) -> f64 {
    base_m + amplitude_m * (index as f64 * 0.1).sin()
}

/// Cumulative distance assuming a constant walking-to-jogging speed.
pub fn fallback_distance(index: usize) -> f64 {
    index as f64 * ASSUMED_SPEED_MPS
}

/// Slow heart-rate wave with sensor-like jitter, clamped to `[60, max_hr]`.
pub fn fallback_heart_rate(index: usize, max_hr: f64, rng: &mut impl Rng) -> i32 {
    let wave = 20.0 * (index as f64 * 0.05).sin();
    let jitter = Normal::new(0.0, 2.5).unwrap().sample(rng);
    let value = (BASE_HEART_RATE + wave + jitter).round();
    value.min(max_hr).max(60.0) as i32
}
