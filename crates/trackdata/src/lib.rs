//! Track synthesis and training-feature engineering core.
//!
//! Two pipelines share the primitives in this crate:
//!
//! - **Feature pipeline**: decoded per-second device samples are range
//!   cleaned and enriched with derived training features (zones, lags,
//!   rolling smoothing, interval detection) by [`features`].
//! - **Enhancement pipeline**: a parsed source activity whose laps carry
//!   little more than heart rates is rebuilt into a complete track by
//!   [`synthesis`], with speeds modelled from heart rate ([`speed`]),
//!   positions simulated inside a bounded arena ([`motion`]) and the
//!   remaining gaps filled by [`interpolate`].
//!
//! Everything here is a pure in-memory transformation: no I/O, no ambient
//! configuration, and all randomness is drawn from an injected
//! [`rand::Rng`].
//!
//! # Quick start
//!
//! ```rust,ignore
//! use trackdata::prelude::*;
//!
//! let config = SynthesisConfig::default();
//! let mut rng = rand::thread_rng();
//! let enhanced = enhance_activity(&source_activity, &config, &mut rng);
//! ```

pub mod config;
pub mod features;
pub mod interpolate;
pub mod motion;
pub mod speed;
pub mod synthesis;
pub mod types;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{
        ArenaConfig, ArenaShape, FeatureConfig, SpeedModelConfig, SynthesisConfig,
    };
    pub use crate::features::{SpeedQuartiles, clean_samples, engineer_features};
    pub use crate::motion::MotionSimulator;
    pub use crate::speed::speed_from_heart_rate;
    pub use crate::synthesis::{
        SynthesizedTrack, allocate_lap_distances, enhance_activity, synthesize_track,
    };
    pub use crate::types::{
        ActivitySample, DerivedFeatures, EnhancedActivity, EnhancedLap, EnhancedTrackpoint,
        Position, SourceActivity, SourceLap, SourceTrackpoint,
    };
}
