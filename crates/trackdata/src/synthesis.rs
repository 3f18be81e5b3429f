//! Per-lap track synthesis and activity-level orchestration.
//!
//! Turns heart-rate-only laps into complete tracks: each trackpoint gets an
//! instantaneous speed from the heart-rate model, a simulated position, a
//! fallback altitude and timestamp where the source has none, and a
//! cumulative distance scaled so the lap lands exactly on its allocated
//! share of the activity's target distance.

use rand::Rng;
use time::OffsetDateTime;
use tracing::warn;

use crate::config::SynthesisConfig;
use crate::interpolate;
use crate::motion::MotionSimulator;
use crate::speed::speed_from_heart_rate;
use crate::types::{
    EnhancedActivity, EnhancedLap, EnhancedTrackpoint, SourceActivity, SourceLap, SourceTrackpoint,
};

/// A synthesized lap track plus the aggregates derived from it.
#[derive(Debug, Clone, Default)]
pub struct SynthesizedTrack {
    pub trackpoints: Vec<EnhancedTrackpoint>,
    /// Maximum post-scale speed, 0 when no point moved.
    pub maximum_speed_mps: f64,
    /// Rounded mean of the synthesized per-point cadence.
    pub average_cadence_rpm: i32,
}

/// Splits a target activity distance across laps in proportion to effort.
///
/// Each lap's effort level is its mean heart rate above the resting
/// baseline, floored at zero; a lap with no elevated heart rate receives
/// nothing. When no lap shows any effort the distance is split evenly.
/// Allocations always sum to `total_distance_m` (within floating point).
pub fn allocate_lap_distances(
    laps: &[SourceLap],
    total_distance_m: f64,
    resting_hr: f64,
) -> Vec<f64> {
    if laps.is_empty() {
        return Vec::new();
    }

    let levels: Vec<f64> = laps
        .iter()
        .map(|lap| (lap.mean_heart_rate() - resting_hr).max(0.0))
        .collect();
    let total_level: f64 = levels.iter().sum();

    if total_level <= 0.0 {
        let share = total_distance_m / laps.len() as f64;
        return vec![share; laps.len()];
    }

    levels
        .iter()
        .map(|level| level / total_level * total_distance_m)
        .collect()
}

/// Synthesizes a complete track for one lap.
///
/// Distance is integrated from the modelled speeds at the assumed 1 Hz
/// sample spacing (the first point contributes nothing), then every
/// distance and speed is rescaled so the final cumulative distance equals
/// `target_distance_m` exactly while relative pacing is preserved. Cadence
/// is attached from the post-scale speed.
pub fn synthesize_track(
    points: &[SourceTrackpoint],
    target_distance_m: f64,
    base_time: OffsetDateTime,
    config: &SynthesisConfig,
    simulator: &mut MotionSimulator,
    rng: &mut impl Rng,
) -> SynthesizedTrack {
    if points.is_empty() {
        warn!("lap has no trackpoints, nothing to synthesize");
        return SynthesizedTrack::default();
    }

    let mut cumulative_m = 0.0;
    let mut trackpoints = Vec::with_capacity(points.len());

    for (index, point) in points.iter().enumerate() {
        let hr = f64::from(point.heart_rate.unwrap_or(0));
        let speed = speed_from_heart_rate(hr, &config.speed, rng);

        if index > 0 && speed > 0.0 {
            cumulative_m += speed; // 1 second interval
        }

        // Step the simulator even when the source has a position so the
        // simulated trajectory stays continuous across gaps.
        let simulated = simulator.step(speed, rng);
        let position = point.position.unwrap_or(simulated);
        let altitude_m = point.altitude_m.unwrap_or_else(|| {
            interpolate::fallback_altitude(
                index,
                config.arena.center_altitude_m,
                config.altitude_amplitude_m,
            )
        });
        let time = point
            .time
            .unwrap_or_else(|| interpolate::fallback_time(base_time, index));

        trackpoints.push(EnhancedTrackpoint {
            time,
            position,
            altitude_m,
            distance_m: cumulative_m,
            heart_rate: point.heart_rate,
            speed_mps: speed,
            cadence_rpm: 0,
        });
    }

    let scale = if cumulative_m > 0.0 && target_distance_m > 0.0 {
        target_distance_m / cumulative_m
    } else {
        1.0
    };

    for tp in &mut trackpoints {
        tp.distance_m *= scale;
        tp.speed_mps *= scale;
        tp.cadence_rpm = if tp.speed_mps > 0.0 {
            (75.0 + tp.speed_mps * 5.0).round() as i32
        } else {
            0
        };
    }

    let maximum_speed_mps = trackpoints
        .iter()
        .map(|tp| tp.speed_mps)
        .filter(|speed| *speed > 0.0)
        .fold(0.0, f64::max);
    let average_cadence_rpm = (trackpoints
        .iter()
        .map(|tp| f64::from(tp.cadence_rpm))
        .sum::<f64>()
        / trackpoints.len() as f64)
        .round() as i32;

    SynthesizedTrack {
        trackpoints,
        maximum_speed_mps,
        average_cadence_rpm,
    }
}

/// Rebuilds a whole activity with synthesized tracks and lap aggregates.
///
/// One motion simulator spans the conversion, so the simulated athlete's
/// trajectory is continuous across lap boundaries.
pub fn enhance_activity(
    activity: &SourceActivity,
    config: &SynthesisConfig,
    rng: &mut impl Rng,
) -> EnhancedActivity {
    if activity.laps.is_empty() {
        warn!(activity = %activity.id, "activity has no laps");
    }

    let allocations =
        allocate_lap_distances(&activity.laps, config.total_distance_m, config.speed.resting_hr);
    let mut simulator = MotionSimulator::new(config.arena.clone(), rng);

    let laps = activity
        .laps
        .iter()
        .zip(allocations)
        .map(|(lap, target_m)| enhance_lap(lap, target_m, config, &mut simulator, rng))
        .collect();

    EnhancedActivity {
        id: activity.id.clone(),
        sport: activity.sport.clone(),
        laps,
    }
}

fn enhance_lap(
    lap: &SourceLap,
    target_distance_m: f64,
    config: &SynthesisConfig,
    simulator: &mut MotionSimulator,
    rng: &mut impl Rng,
) -> EnhancedLap {
    let start_time = lap.start_time.unwrap_or_else(OffsetDateTime::now_utc);
    let track = synthesize_track(
        &lap.trackpoints,
        target_distance_m,
        start_time,
        config,
        simulator,
        rng,
    );

    EnhancedLap {
        start_time,
        total_time_seconds: lap
            .total_time_seconds
            .unwrap_or(lap.trackpoints.len() as f64),
        distance_m: target_distance_m,
        maximum_speed_mps: track.maximum_speed_mps,
        calories: lap
            .calories
            .unwrap_or_else(|| (target_distance_m * 0.05).round() as u32),
        average_heart_rate: lap
            .average_heart_rate
            .unwrap_or_else(|| observed_mean_heart_rate(&lap.trackpoints)),
        maximum_heart_rate: lap
            .maximum_heart_rate
            .unwrap_or_else(|| observed_max_heart_rate(&lap.trackpoints)),
        intensity: lap.intensity.clone().unwrap_or_else(|| "Active".to_owned()),
        trigger_method: lap
            .trigger_method
            .clone()
            .unwrap_or_else(|| "Manual".to_owned()),
        cadence_rpm: track.average_cadence_rpm,
        trackpoints: track.trackpoints,
    }
}

/// Mean of the observed heart rates, 0 when the lap has none.
fn observed_mean_heart_rate(points: &[SourceTrackpoint]) -> i32 {
    let observed: Vec<f64> = points
        .iter()
        .filter_map(|tp| tp.heart_rate.map(f64::from))
        .collect();
    if observed.is_empty() {
        return 0;
    }
    (observed.iter().sum::<f64>() / observed.len() as f64).round() as i32
}

/// Highest observed heart rate, 0 when the lap has none.
fn observed_max_heart_rate(points: &[SourceTrackpoint]) -> i32 {
    points
        .iter()
        .filter_map(|tp| tp.heart_rate)
        .max()
        .unwrap_or(0)
}
