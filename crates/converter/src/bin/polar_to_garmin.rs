//! Converts one source (Polar) TCX file into an enhanced target (Garmin)
//! TCX document with a fully synthesized track.
//!
//! Run with:
//! ```
//! TCX_INPUT_PATH=./tcx-files/input.tcx TCX_OUTPUT_PATH=./tcx-files/output.tcx \
//!     cargo run -p converter --bin polar_to_garmin
//! ```

use std::fs;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use converter::{env, tcx};
use trackdata::synthesis;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let input_path = PathBuf::from(env::var_or("TCX_INPUT_PATH", "./tcx-files/input.tcx"));
    let output_path = PathBuf::from(env::var_or("TCX_OUTPUT_PATH", "./tcx-files/output.tcx"));
    let config = env::synthesis_config_from_env();

    let text = fs::read_to_string(&input_path)?;
    let source = tcx::source::parse_source_activity(&text)?;
    info!(
        activity = %source.id,
        laps = source.laps.len(),
        "parsed source activity"
    );

    let mut rng = rand::thread_rng();
    let enhanced = synthesis::enhance_activity(&source, &config, &mut rng);
    let xml = tcx::writer::write_activity(&enhanced)?;
    fs::write(&output_path, xml)?;

    info!(
        output = %output_path.display(),
        distance_m = enhanced.total_distance_m(),
        "wrote enhanced activity"
    );
    Ok(())
}
