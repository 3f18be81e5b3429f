//! Batch-converts a directory of FIT recordings into one training-data CSV.
//!
//! Run with:
//! ```
//! FIT_INPUT_DIR=./fit_files CSV_OUTPUT_PATH=./training_data.csv \
//!     cargo run -p converter --bin fit_to_csv
//! ```

use std::fs;
use std::path::PathBuf;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use converter::{csv_out, env, fit};
use trackdata::features;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let input_dir = PathBuf::from(env::var_or("FIT_INPUT_DIR", "./fit_files"));
    let output_path = PathBuf::from(env::var_or("CSV_OUTPUT_PATH", "./training_data.csv"));
    let config = env::feature_config_from_env();

    let mut fit_files: Vec<PathBuf> = fs::read_dir(&input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("fit"))
        })
        .collect();
    fit_files.sort();

    if fit_files.is_empty() {
        anyhow::bail!("no FIT files found in {}", input_dir.display());
    }
    info!(count = fit_files.len(), "found FIT files");

    let mut writer = csv::Writer::from_path(&output_path)?;
    csv_out::write_header(&mut writer)?;

    let mut total_rows = 0usize;
    for path in &fit_files {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(file = %path.display(), "failed to read: {e}");
                continue;
            }
        };

        // A file that fails to decode is logged and skipped; the batch
        // continues with the rest.
        let decoded = match fit::decode_activity(&bytes, &config) {
            Ok(decoded) => decoded,
            Err(e) => {
                error!(file = %path.display(), "failed to decode: {e}");
                continue;
            }
        };

        let mut samples = decoded.samples;
        if samples.is_empty() {
            warn!(file = %path.display(), "no usable data points");
            continue;
        }

        features::engineer_features(&mut samples, decoded.max_heart_rate, &config);

        let activity_id = fit::activity_id_from_path(path);
        csv_out::write_samples(&mut writer, &activity_id, &samples)?;
        total_rows += samples.len();
        info!(file = %path.display(), rows = samples.len(), "processed");
    }
    writer.flush()?;

    if total_rows == 0 {
        anyhow::bail!("no training data produced");
    }

    info!(
        rows = total_rows,
        output = %output_path.display(),
        "conversion complete"
    );
    Ok(())
}
