//! Per-sample training-feature derivation for the tabular pipeline.
//!
//! Works over the full sample sequence of one activity. Range cleaning and
//! the gradient pass are local; zones, lags, smoothing and interval flags
//! need activity-wide aggregates and run in a second pass once the whole
//! sequence is materialized.

use tracing::warn;

use crate::config::FeatureConfig;
use crate::types::ActivitySample;

/// Nearest-rank speed quartiles for one activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedQuartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Returns the heart rate unchanged when inside the configured range,
/// `None` otherwise.
pub fn clean_heart_rate(hr: Option<i32>, config: &FeatureConfig) -> Option<i32> {
    hr.filter(|&value| {
        let value = f64::from(value);
        value >= config.min_heart_rate && value <= config.max_heart_rate
    })
}

/// Returns the speed unchanged when inside the configured range, `None`
/// otherwise.
pub fn clean_speed(speed: Option<f64>, config: &FeatureConfig) -> Option<f64> {
    speed.filter(|&value| value >= config.min_speed_mps && value <= config.max_speed_mps)
}

/// Computes nearest-rank quartiles of the given speeds. `None` when empty.
pub fn speed_quartiles(speeds: &[f64]) -> Option<SpeedQuartiles> {
    if speeds.is_empty() {
        return None;
    }
    let mut sorted = speeds.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = |fraction: f64| sorted[(sorted.len() as f64 * fraction) as usize];
    Some(SpeedQuartiles {
        q1: rank(0.25),
        q2: rank(0.5),
        q3: rank(0.75),
    })
}

/// Activity-relative speed zone 1-4 by quartile bucket.
pub fn speed_zone(speed_mps: f64, quartiles: SpeedQuartiles) -> u8 {
    if speed_mps <= quartiles.q1 {
        1
    } else if speed_mps <= quartiles.q2 {
        2
    } else if speed_mps <= quartiles.q3 {
        3
    } else {
        4
    }
}

/// Heart-rate zone 1-5 as a percentage of the activity maximum heart rate.
pub fn heart_rate_zone(hr: i32, max_hr: f64) -> Option<u8> {
    if max_hr <= 0.0 {
        return None;
    }
    let percent = f64::from(hr) / max_hr * 100.0;
    Some(if percent < 60.0 {
        1
    } else if percent < 70.0 {
        2
    } else if percent < 80.0 {
        3
    } else if percent < 90.0 {
        4
    } else {
        5
    })
}

/// Pace in minutes per kilometer for a positive speed.
pub fn pace_min_per_km(speed_mps: f64) -> Option<f64> {
    if speed_mps <= 0.0 {
        return None;
    }
    Some(1000.0 / speed_mps / 60.0)
}

/// Runs the full feature-engineering sequence in place: range cleaning,
/// the per-sample gradient pass, then the activity-wide pass.
///
/// `activity_max_hr` is the recording's maximum heart rate when the device
/// reported one, otherwise the configured fallback.
pub fn engineer_features(
    samples: &mut [ActivitySample],
    activity_max_hr: f64,
    config: &FeatureConfig,
) {
    if samples.is_empty() {
        warn!("activity has no samples, no features to derive");
        return;
    }

    clean_samples(samples, config);
    apply_gradients(samples, config);
    apply_activity_features(samples, activity_max_hr, config);
}

/// Nulls out-of-range heart rates and speeds and derives pace from the
/// surviving speed. Idempotent.
pub fn clean_samples(samples: &mut [ActivitySample], config: &FeatureConfig) {
    for sample in samples.iter_mut() {
        sample.heart_rate = clean_heart_rate(sample.heart_rate, config);
        sample.speed_mps = clean_speed(sample.speed_mps, config);
        sample.features.pace_min_per_km = sample.speed_mps.and_then(pace_min_per_km);
    }
}

/// Derives elevation-change rate, grade and the uphill flag from
/// consecutive samples. The last known altitude carries forward across
/// samples that lack one.
fn apply_gradients(samples: &mut [ActivitySample], config: &FeatureConfig) {
    let mut previous_altitude: Option<f64> = None;
    let mut previous_timestamp: Option<time::OffsetDateTime> = None;

    for sample in samples.iter_mut() {
        if let (Some(altitude), Some(prev_altitude), Some(prev_ts)) =
            (sample.altitude_m, previous_altitude, previous_timestamp)
        {
            let altitude_change = altitude - prev_altitude;
            let time_change = (sample.timestamp - prev_ts).as_seconds_f64();

            if time_change > 0.0 {
                sample.features.elevation_change_mps = Some(altitude_change / time_change);

                // Grade needs a horizontal-distance estimate, which needs
                // both distance data and a usable speed.
                if sample.distance_m.is_some() {
                    let horizontal_m = sample.speed_mps.unwrap_or(0.0) * time_change;
                    if horizontal_m > 0.0 {
                        sample.features.grade_percent =
                            Some(altitude_change / horizontal_m * 100.0);
                    }
                }
            }
        }

        sample.features.is_uphill = sample
            .features
            .grade_percent
            .map(|grade| grade > config.grade_threshold);

        previous_altitude = sample.altitude_m.or(previous_altitude);
        previous_timestamp = Some(sample.timestamp);
    }
}

/// The activity-wide pass: speed zones, heart-rate zones, lag features,
/// rolling smoothing and interval detection.
fn apply_activity_features(
    samples: &mut [ActivitySample],
    activity_max_hr: f64,
    config: &FeatureConfig,
) {
    let valid_speeds: Vec<f64> = samples.iter().filter_map(|s| s.speed_mps).collect();
    let quartiles = speed_quartiles(&valid_speeds);

    for index in 0..samples.len() {
        let sample = &samples[index];

        let hr_zone = sample
            .heart_rate
            .and_then(|hr| heart_rate_zone(hr, activity_max_hr));
        let speed_zone = match (sample.speed_mps, quartiles) {
            (Some(speed), Some(quartiles)) => Some(self::speed_zone(speed, quartiles)),
            _ => None,
        };
        let is_interval = match (sample.speed_mps, quartiles) {
            (Some(speed), Some(quartiles)) => Some(speed > quartiles.q3),
            _ => None,
        };
        let hr_lag_5s = index.checked_sub(5).and_then(|i| samples[i].heart_rate);
        let hr_lag_10s = index.checked_sub(10).and_then(|i| samples[i].heart_rate);
        let smoothed = rolling_average_speed(samples, index, config.smoothing_window_seconds);

        let features = &mut samples[index].features;
        features.hr_zone = hr_zone;
        features.speed_zone = speed_zone;
        features.is_interval = is_interval;
        features.hr_lag_5s = hr_lag_5s;
        features.hr_lag_10s = hr_lag_10s;
        features.speed_smoothed = smoothed;
    }
}

/// Mean speed over the trailing window ending at `index`, using only the
/// samples that have one. `None` when the window holds no valid value.
fn rolling_average_speed(
    samples: &[ActivitySample],
    index: usize,
    window_seconds: usize,
) -> Option<f64> {
    let start = index.saturating_sub(window_seconds.saturating_sub(1));
    let values: Vec<f64> = samples[start..=index]
        .iter()
        .filter_map(|s| s.speed_mps)
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    fn base_samples(count: usize) -> Vec<ActivitySample> {
        let start = datetime!(2023-04-01 09:00:00 UTC);
        (0..count)
            .map(|i| ActivitySample::new(start + Duration::seconds(i as i64), i as i64))
            .collect()
    }

    #[test]
    fn test_clean_heart_rate_in_range_unchanged() {
        let config = FeatureConfig::default();
        assert_eq!(clean_heart_rate(Some(60), &config), Some(60));
        assert_eq!(clean_heart_rate(Some(150), &config), Some(150));
        assert_eq!(clean_heart_rate(Some(220), &config), Some(220));
    }

    #[test]
    fn test_clean_heart_rate_out_of_range_nulled() {
        let config = FeatureConfig::default();
        assert_eq!(clean_heart_rate(Some(59), &config), None);
        assert_eq!(clean_heart_rate(Some(221), &config), None);
        assert_eq!(clean_heart_rate(None, &config), None);
    }

    #[test]
    fn test_clean_speed_bounds() {
        let config = FeatureConfig::default();
        assert_eq!(clean_speed(Some(0.5), &config), Some(0.5));
        assert_eq!(clean_speed(Some(15.0), &config), Some(15.0));
        assert_eq!(clean_speed(Some(0.4), &config), None);
        assert_eq!(clean_speed(Some(15.1), &config), None);
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let config = FeatureConfig::default();
        let mut samples = base_samples(3);
        samples[0].heart_rate = Some(150);
        samples[1].heart_rate = Some(30);
        samples[2].speed_mps = Some(20.0);

        clean_samples(&mut samples, &config);
        let once = samples.clone();
        clean_samples(&mut samples, &config);

        assert_eq!(samples, once);
        assert_eq!(samples[0].heart_rate, Some(150));
        assert_eq!(samples[1].heart_rate, None);
        assert_eq!(samples[2].speed_mps, None);
    }

    #[test]
    fn test_quartiles_are_ordered() {
        let speeds = vec![5.0, 1.0, 3.0, 2.0, 4.0, 6.0, 7.0, 8.0];
        let q = speed_quartiles(&speeds).unwrap();
        assert!(q.q1 <= q.q2);
        assert!(q.q2 <= q.q3);
    }

    #[test]
    fn test_quartiles_empty() {
        assert_eq!(speed_quartiles(&[]), None);
    }

    #[test]
    fn test_speed_zone_monotonic_in_speed() {
        let q = SpeedQuartiles {
            q1: 2.0,
            q2: 3.0,
            q3: 4.0,
        };
        let mut last_zone = 0;
        for speed in [1.0, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5] {
            let zone = speed_zone(speed, q);
            assert!(zone >= last_zone);
            last_zone = zone;
        }
        assert_eq!(speed_zone(2.0, q), 1);
        assert_eq!(speed_zone(4.5, q), 4);
    }

    #[test]
    fn test_heart_rate_zone_buckets() {
        assert_eq!(heart_rate_zone(100, 200.0), Some(1)); // 50%
        assert_eq!(heart_rate_zone(130, 200.0), Some(2)); // 65%
        assert_eq!(heart_rate_zone(150, 200.0), Some(3)); // 75%
        assert_eq!(heart_rate_zone(170, 200.0), Some(4)); // 85%
        assert_eq!(heart_rate_zone(190, 200.0), Some(5)); // 95%
        assert_eq!(heart_rate_zone(150, 0.0), None);
    }

    #[test]
    fn test_lag_features_index_earlier_samples() {
        let config = FeatureConfig::default();
        let mut samples = base_samples(15);
        for (i, sample) in samples.iter_mut().enumerate() {
            sample.heart_rate = Some(100 + i as i32);
        }

        engineer_features(&mut samples, 200.0, &config);

        for i in 0..15 {
            let expected_5 = if i >= 5 { Some(100 + i as i32 - 5) } else { None };
            let expected_10 = if i >= 10 {
                Some(100 + i as i32 - 10)
            } else {
                None
            };
            assert_eq!(samples[i].features.hr_lag_5s, expected_5);
            assert_eq!(samples[i].features.hr_lag_10s, expected_10);
        }
    }

    #[test]
    fn test_rolling_average_uses_trailing_window() {
        let config = FeatureConfig {
            smoothing_window_seconds: 3,
            ..Default::default()
        };
        let mut samples = base_samples(5);
        for (i, sample) in samples.iter_mut().enumerate() {
            sample.speed_mps = Some(1.0 + i as f64);
        }

        engineer_features(&mut samples, 200.0, &config);

        // Window of 3 ending at index 4: speeds 3, 4, 5.
        assert!((samples[4].features.speed_smoothed.unwrap() - 4.0).abs() < 1e-9);
        // Short head window: speeds 1, 2.
        assert!((samples[1].features.speed_smoothed.unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_average_skips_missing_values() {
        let config = FeatureConfig {
            smoothing_window_seconds: 4,
            ..Default::default()
        };
        let mut samples = base_samples(4);
        samples[0].speed_mps = Some(2.0);
        samples[2].speed_mps = Some(4.0);

        engineer_features(&mut samples, 200.0, &config);

        assert!((samples[3].features.speed_smoothed.unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_interval_flag_above_q3() {
        let config = FeatureConfig::default();
        let mut samples = base_samples(8);
        let speeds = [2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 9.0];
        for (sample, speed) in samples.iter_mut().zip(speeds) {
            sample.speed_mps = Some(speed);
        }

        engineer_features(&mut samples, 200.0, &config);

        // q3 is the nearest-rank 75th percentile (5.0 for these 8 values).
        assert_eq!(samples[7].features.is_interval, Some(true));
        assert_eq!(samples[0].features.is_interval, Some(false));
        assert_eq!(samples[6].features.is_interval, Some(false));
    }

    #[test]
    fn test_gradients_from_altitude_and_speed() {
        let config = FeatureConfig::default();
        let mut samples = base_samples(3);
        for sample in samples.iter_mut() {
            sample.speed_mps = Some(2.0);
            sample.distance_m = Some(10.0);
        }
        samples[0].altitude_m = Some(100.0);
        samples[1].altitude_m = Some(101.0);
        samples[2].altitude_m = Some(100.5);

        engineer_features(&mut samples, 200.0, &config);

        // 1 m climb over 2 m horizontal in 1 s.
        assert!((samples[1].features.elevation_change_mps.unwrap() - 1.0).abs() < 1e-9);
        assert!((samples[1].features.grade_percent.unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(samples[1].features.is_uphill, Some(true));
        assert_eq!(samples[2].features.is_uphill, Some(false));
        // No previous altitude for the first sample.
        assert_eq!(samples[0].features.grade_percent, None);
        assert_eq!(samples[0].features.is_uphill, None);
    }

    #[test]
    fn test_altitude_carries_forward_across_gaps() {
        let config = FeatureConfig::default();
        let mut samples = base_samples(3);
        for sample in samples.iter_mut() {
            sample.speed_mps = Some(2.0);
            sample.distance_m = Some(10.0);
        }
        samples[0].altitude_m = Some(100.0);
        samples[2].altitude_m = Some(102.0);

        engineer_features(&mut samples, 200.0, &config);

        // The gap sample derives nothing; the next one measures its climb
        // against the last known altitude.
        assert_eq!(samples[1].features.elevation_change_mps, None);
        assert!((samples[2].features.elevation_change_mps.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_activity_is_a_no_op() {
        let config = FeatureConfig::default();
        let mut samples: Vec<ActivitySample> = Vec::new();
        engineer_features(&mut samples, 200.0, &config);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_pace_from_speed() {
        assert!((pace_min_per_km(4.0).unwrap() - 4.166_666_666_666_667).abs() < 1e-9);
        assert_eq!(pace_min_per_km(0.0), None);
    }
}
