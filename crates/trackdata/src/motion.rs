//! Bounded stochastic motion simulation.
//!
//! Produces a physically continuous position sequence for an activity whose
//! only driving signal is instantaneous speed. The simulated athlete wanders
//! between random waypoints inside a configured arena, drifts back inward
//! near the edges, and retreats to a sideline spot after a sustained stop.

use geo::{Distance as _, Haversine, geometry::Point};
use rand::Rng;

use crate::config::{ArenaConfig, ArenaShape};
use crate::types::Position;

/// Approximately 111 km per degree of latitude.
const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// Consecutive zero-speed samples before the athlete moves to the sideline.
const SIDELINE_AFTER_IDLE: u32 = 3;

/// Within this range of the current waypoint a new one is drawn.
const TARGET_REACHED_M: f64 = 15.0;

/// Sideline anchor offset from the arena centre, in meters.
const SIDELINE_OFFSET_M: f64 = -30.0;

fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE_LAT
}

fn meters_to_lon_degrees(meters: f64, latitude: f64) -> f64 {
    meters / (METERS_PER_DEGREE_LAT * latitude.to_radians().cos())
}

fn distance_m(a: Position, b: Position) -> f64 {
    Haversine.distance(
        Point::new(a.longitude, a.latitude),
        Point::new(b.longitude, b.latitude),
    )
}

/// A 2D direction in degree-space, not necessarily unit length.
#[derive(Debug, Clone, Copy, Default)]
struct Direction {
    lat: f64,
    lon: f64,
}

impl Direction {
    fn normalized(self) -> Self {
        let magnitude = (self.lat * self.lat + self.lon * self.lon).sqrt();
        if magnitude > 0.0 {
            Self {
                lat: self.lat / magnitude,
                lon: self.lon / magnitude,
            }
        } else {
            self
        }
    }
}

/// Simulates one athlete's movement within an arena.
///
/// All motion state is owned here: construct one simulator per activity
/// conversion (or call [`reset`](Self::reset) between activities) and feed
/// it one speed sample per second via [`step`](Self::step). Sharing an
/// instance between concurrently-converted activities corrupts both
/// trajectories; each conversion must own its own.
#[derive(Debug, Clone)]
pub struct MotionSimulator {
    arena: ArenaConfig,
    current: Position,
    on_sideline: bool,
    sideline: Option<Position>,
    momentum: Direction,
    idle_samples: u32,
    target: Position,
    target_age: u32,
    target_refresh: u32,
}

impl MotionSimulator {
    /// Creates a simulator starting at the arena centre.
    pub fn new(arena: ArenaConfig, rng: &mut impl Rng) -> Self {
        let center = Position::new(arena.center_latitude, arena.center_longitude);
        let target = random_target(&arena, rng);
        Self {
            arena,
            current: center,
            on_sideline: false,
            sideline: None,
            momentum: Direction::default(),
            idle_samples: 0,
            target,
            target_age: 0,
            target_refresh: rng.gen_range(8..=20),
        }
    }

    /// Clears all motion state, as at the start of a new activity.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        *self = Self::new(self.arena.clone(), rng);
    }

    /// The configured arena.
    pub fn arena(&self) -> &ArenaConfig {
        &self.arena
    }

    /// Advances the simulation by one second at the given speed and returns
    /// the athlete's position for this sample.
    pub fn step(&mut self, speed_mps: f64, rng: &mut impl Rng) -> Position {
        self.target_age += 1;
        if self.target_age > self.target_refresh {
            self.retarget(rng);
        }

        if speed_mps == 0.0 {
            self.idle_samples += 1;
        } else {
            self.idle_samples = 0;
        }

        let benched = speed_mps == 0.0 && self.idle_samples > SIDELINE_AFTER_IDLE;
        if benched {
            return self.hold_sideline(rng);
        }

        if self.on_sideline {
            // Back onto the field: aim somewhere fresh.
            self.on_sideline = false;
            self.sideline = None;
            self.retarget(rng);
        }

        if speed_mps > 0.0 {
            self.advance(speed_mps, rng)
        } else {
            // Briefly stationary on the field: hold position with GPS-noise
            // sized jitter, without disturbing the simulated position.
            jittered(self.current, 0.5, rng)
        }
    }

    fn hold_sideline(&mut self, rng: &mut impl Rng) -> Position {
        match self.sideline {
            Some(anchor) => jittered(anchor, 2.0, rng),
            None => {
                let anchor = self.random_sideline(rng);
                self.on_sideline = true;
                self.sideline = Some(anchor);
                anchor
            }
        }
    }

    fn advance(&mut self, speed_mps: f64, rng: &mut impl Rng) -> Position {
        let center = Position::new(self.arena.center_latitude, self.arena.center_longitude);
        let from_center = distance_m(self.current, center);

        if distance_m(self.current, self.target) < TARGET_REACHED_M {
            self.retarget(rng);
        }

        let direction = self.blended_direction(from_center, rng);
        self.momentum = Direction {
            lat: direction.lat * 0.7 + self.momentum.lat * 0.3,
            lon: direction.lon * 0.7 + self.momentum.lon * 0.3,
        };

        // One second of travel, with a little stride-to-stride variation.
        let step_m = speed_mps * rng.gen_range(0.9..1.1);
        let mut next = Position::new(
            self.current.latitude + meters_to_lat_degrees(step_m * direction.lat),
            self.current.longitude
                + meters_to_lon_degrees(step_m * direction.lon, self.current.latitude),
        );

        if !self.contains(next) {
            next = self.clamp_to_arena(next);
            self.retarget(rng);
        }

        self.current = next;
        next
    }

    /// Blends a random heading, the pull towards the current waypoint, and
    /// the previous heading's momentum into a unit direction.
    fn blended_direction(&self, from_center_m: f64, rng: &mut impl Rng) -> Direction {
        let towards_target = Direction {
            lat: self.target.latitude - self.current.latitude,
            lon: self.target.longitude - self.current.longitude,
        }
        .normalized();

        // The waypoint pull grows superlinearly towards the edge of the
        // arena so paths curve back inward, capped so the walk stays loose.
        let reach = match self.arena.shape {
            ArenaShape::Rectangle { width_m, height_m } => {
                (width_m * width_m + height_m * height_m).sqrt() / 2.0
            }
            ArenaShape::Circle { radius_m } => radius_m,
        };
        let bias = if reach > 0.0 {
            (from_center_m / reach).powf(1.5).min(0.3)
        } else {
            0.3
        };

        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let random = Direction {
            lat: angle.sin(),
            lon: angle.cos(),
        };

        let blended = Direction {
            lat: random.lat * (1.0 - bias) + towards_target.lat * bias,
            lon: random.lon * (1.0 - bias) + towards_target.lon * bias,
        };

        let with_jitter = Direction {
            lat: blended.lat + (rng.r#gen::<f64>() - 0.5) * 0.4,
            lon: blended.lon + (rng.r#gen::<f64>() - 0.5) * 0.4,
        };

        Direction {
            lat: with_jitter.lat * 0.7 + self.momentum.lat * 0.3,
            lon: with_jitter.lon * 0.7 + self.momentum.lon * 0.3,
        }
        .normalized()
    }

    fn contains(&self, position: Position) -> bool {
        let center = Position::new(self.arena.center_latitude, self.arena.center_longitude);
        match self.arena.shape {
            ArenaShape::Rectangle { width_m, height_m } => {
                let lat_diff = (position.latitude - center.latitude).abs();
                let lon_diff = (position.longitude - center.longitude).abs();
                lat_diff <= meters_to_lat_degrees(height_m / 2.0)
                    && lon_diff <= meters_to_lon_degrees(width_m / 2.0, center.latitude)
            }
            ArenaShape::Circle { radius_m } => distance_m(position, center) <= radius_m,
        }
    }

    fn clamp_to_arena(&self, position: Position) -> Position {
        let center = Position::new(self.arena.center_latitude, self.arena.center_longitude);
        match self.arena.shape {
            ArenaShape::Rectangle { width_m, height_m } => {
                let max_lat_diff = meters_to_lat_degrees(height_m / 2.0);
                let max_lon_diff = meters_to_lon_degrees(width_m / 2.0, center.latitude);
                let lat_diff = position.latitude - center.latitude;
                let lon_diff = position.longitude - center.longitude;
                Position::new(
                    center.latitude + lat_diff.signum() * lat_diff.abs().min(max_lat_diff),
                    center.longitude + lon_diff.signum() * lon_diff.abs().min(max_lon_diff),
                )
            }
            ArenaShape::Circle { radius_m } => {
                let from_center = distance_m(position, center);
                if from_center <= radius_m || from_center == 0.0 {
                    return position;
                }
                let scale = radius_m / from_center;
                Position::new(
                    center.latitude + (position.latitude - center.latitude) * scale,
                    center.longitude + (position.longitude - center.longitude) * scale,
                )
            }
        }
    }

    fn retarget(&mut self, rng: &mut impl Rng) {
        self.target = random_target(&self.arena, rng);
        self.target_age = 0;
        self.target_refresh = rng.gen_range(8..=20);
    }

    fn random_sideline(&self, rng: &mut impl Rng) -> Position {
        let center_lat = self.arena.center_latitude;
        let along_variation = (rng.r#gen::<f64>() - 0.5) * 10.0;
        Position::new(
            center_lat + meters_to_lat_degrees(along_variation),
            self.arena.center_longitude + meters_to_lon_degrees(SIDELINE_OFFSET_M, center_lat),
        )
    }
}

/// Draws a waypoint within 60-90% of the arena's extent.
fn random_target(arena: &ArenaConfig, rng: &mut impl Rng) -> Position {
    let center_lat = arena.center_latitude;
    let (north_m, east_m) = match arena.shape {
        ArenaShape::Rectangle { width_m, height_m } => {
            let target_width = (0.6 + rng.r#gen::<f64>() * 0.3) * width_m;
            let target_height = (0.6 + rng.r#gen::<f64>() * 0.3) * height_m;
            (
                (rng.r#gen::<f64>() - 0.5) * target_height,
                (rng.r#gen::<f64>() - 0.5) * target_width,
            )
        }
        ArenaShape::Circle { radius_m } => {
            let reach = (0.6 + rng.r#gen::<f64>() * 0.3) * radius_m;
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            (reach * angle.cos(), reach * angle.sin())
        }
    };
    Position::new(
        center_lat + meters_to_lat_degrees(north_m),
        arena.center_longitude + meters_to_lon_degrees(east_m, center_lat),
    )
}

/// Adds uniform jitter of up to +-`spread_m / 2` meters on each axis.
fn jittered(position: Position, spread_m: f64, rng: &mut impl Rng) -> Position {
    Position::new(
        position.latitude + (rng.r#gen::<f64>() - 0.5) * meters_to_lat_degrees(spread_m),
        position.longitude
            + (rng.r#gen::<f64>() - 0.5) * meters_to_lon_degrees(spread_m, position.latitude),
    )
}
