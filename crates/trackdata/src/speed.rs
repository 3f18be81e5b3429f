//! Heart-rate driven speed model.

use rand::Rng;

use crate::config::SpeedModelConfig;

/// Maps an instantaneous heart rate to a plausible speed in m/s.
///
/// Below `floor_hr` the athlete is assumed to be idle off the field and the
/// output is exactly zero; that zero is what arms the sideline behaviour in
/// the motion simulator. At the floor the output sits at
/// `min_active_speed_mps`, rising towards `max_speed_mps` with a 1.5
/// exponent so moderate heart rates map to jogging and only near-maximal
/// ones to sprinting. Multiplicative noise of up to `speed_variability / 2`
/// either way keeps repeated readings from being identical.
pub fn speed_from_heart_rate(hr: f64, config: &SpeedModelConfig, rng: &mut impl Rng) -> f64 {
    if hr < config.floor_hr {
        return 0.0;
    }

    let hr_range = config.max_hr - config.floor_hr;
    let intensity = if hr_range > 0.0 {
        ((hr - config.floor_hr) / hr_range).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let base = config.min_active_speed_mps
        + (config.max_speed_mps - config.min_active_speed_mps) * intensity.powf(1.5);

    let variability = 1.0 + (rng.r#gen::<f64>() - 0.5) * config.speed_variability;

    (base * variability).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fixed_config() -> SpeedModelConfig {
        SpeedModelConfig {
            floor_hr: 100.0,
            max_hr: 190.0,
            min_active_speed_mps: 1.5,
            max_speed_mps: 8.5,
            speed_variability: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_below_floor_is_zero() {
        let config = fixed_config();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(speed_from_heart_rate(90.0, &config, &mut rng), 0.0);
        assert_eq!(speed_from_heart_rate(0.0, &config, &mut rng), 0.0);
    }

    #[test]
    fn test_floor_hr_maps_to_min_active_speed() {
        let config = fixed_config();
        let mut rng = StdRng::seed_from_u64(1);
        let speed = speed_from_heart_rate(100.0, &config, &mut rng);
        assert!((speed - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_max_hr_approaches_max_speed() {
        let config = fixed_config();
        let mut rng = StdRng::seed_from_u64(1);
        let speed = speed_from_heart_rate(190.0, &config, &mut rng);
        assert!((speed - 8.5).abs() < 1e-9);
    }

    #[test]
    fn test_hr_above_max_is_clamped() {
        let config = fixed_config();
        let mut rng = StdRng::seed_from_u64(1);
        let speed = speed_from_heart_rate(250.0, &config, &mut rng);
        assert!((speed - 8.5).abs() < 1e-9);
    }

    #[test]
    fn test_linear_ramp_scenario() {
        // 20 one-second samples with heart rate climbing 90 -> 170 BPM and
        // noise disabled: the first reading is below the floor, the last one
        // follows the convex intensity curve.
        let config = fixed_config();
        let mut rng = StdRng::seed_from_u64(1);

        let speeds: Vec<f64> = (0..20)
            .map(|i| {
                let hr = 90.0 + 80.0 * i as f64 / 19.0;
                speed_from_heart_rate(hr, &config, &mut rng)
            })
            .collect();

        assert_eq!(speeds[0], 0.0);
        let expected = 1.5 + 7.0 * (70.0_f64 / 90.0).powf(1.5);
        assert!((speeds[19] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_in_heart_rate_without_noise() {
        let config = fixed_config();
        let mut rng = StdRng::seed_from_u64(1);
        let mut last = 0.0;
        for hr in (100..=190).step_by(10) {
            let speed = speed_from_heart_rate(f64::from(hr), &config, &mut rng);
            assert!(speed >= last);
            last = speed;
        }
    }

    #[test]
    fn test_noise_stays_within_variability_band() {
        let config = SpeedModelConfig {
            speed_variability: 0.3,
            ..fixed_config()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let base = 1.5 + 7.0 * (0.5_f64).powf(1.5);
        for _ in 0..200 {
            let speed = speed_from_heart_rate(145.0, &config, &mut rng);
            assert!(speed >= base * 0.85 - 1e-9);
            assert!(speed <= base * 1.15 + 1e-9);
        }
    }
}
