//! FIT recording decoder: raw bytes to typed per-second samples.
//!
//! This is the validation boundary of the feature pipeline. The open-ended
//! decoded messages are converted into fully-typed
//! [`ActivitySample`]s in a single pass; everything downstream operates on
//! the typed model only.

use std::path::Path;

use time::OffsetDateTime;
use tracing::warn;

use trackdata::config::FeatureConfig;
use trackdata::types::{ActivitySample, Position};

/// Error type for FIT decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum FitDecodeError {
    #[error("failed to parse FIT data: {0}")]
    Parse(String),
}

/// A decoded activity: samples plus the recording's maximum heart rate.
#[derive(Debug, Clone)]
pub struct DecodedActivity {
    pub samples: Vec<ActivitySample>,
    /// From the session message when present, otherwise the configured
    /// fallback. Drives heart-rate zone assignment.
    pub max_heart_rate: f64,
}

/// A lap's time window, used to assign samples a 1-based lap number.
#[derive(Debug, Clone, Copy)]
struct LapWindow {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

/// Decodes one FIT activity into typed samples.
///
/// Record messages without a timestamp are dropped. An activity with no
/// record messages at all yields an empty sample list with a warning; only
/// an undecodable file is an error.
pub fn decode_activity(
    bytes: &[u8],
    config: &FeatureConfig,
) -> Result<DecodedActivity, FitDecodeError> {
    let messages =
        fitparser::from_bytes(bytes).map_err(|e| FitDecodeError::Parse(e.to_string()))?;

    let mut records = Vec::new();
    let mut lap_windows = Vec::new();
    let mut max_heart_rate: Option<f64> = None;

    for message in &messages {
        use fitparser::profile::field_types::MesgNum;
        match message.kind() {
            MesgNum::Record => records.push(message),
            MesgNum::Lap => {
                if let Some(window) = lap_window(message) {
                    lap_windows.push(window);
                }
            }
            MesgNum::Session => {
                if max_heart_rate.is_none() {
                    max_heart_rate = field_f64(message, "max_heart_rate").filter(|&v| v > 0.0);
                }
            }
            _ => {}
        }
    }

    let max_heart_rate = max_heart_rate.unwrap_or(config.max_hr_zone);

    if records.is_empty() {
        warn!("no record messages found in FIT data");
        return Ok(DecodedActivity {
            samples: Vec::new(),
            max_heart_rate,
        });
    }

    // Elapsed time counts from the first timestamped record, which keeps it
    // non-negative regardless of what the activity message carries.
    let start_time = records
        .iter()
        .find_map(|r| field_timestamp(r, "timestamp"));

    let mut samples = Vec::with_capacity(records.len());
    for record in records {
        let Some(timestamp) = field_timestamp(record, "timestamp") else {
            continue;
        };
        let start = start_time.unwrap_or(timestamp);
        let mut sample =
            ActivitySample::new(timestamp, (timestamp - start).whole_seconds());

        sample.heart_rate = field_i32(record, "heart_rate");
        sample.speed_mps = field_f64(record, "speed").or_else(|| field_f64(record, "enhanced_speed"));
        sample.distance_m = field_f64(record, "distance");
        sample.altitude_m =
            field_f64(record, "altitude").or_else(|| field_f64(record, "enhanced_altitude"));
        sample.cadence_rpm = field_i32(record, "cadence");
        sample.power_watts = field_i32(record, "power");
        sample.temperature_c = field_f64(record, "temperature");
        sample.position = position_from_semicircles(record);
        sample.lap_number = current_lap(&lap_windows, timestamp);

        samples.push(sample);
    }

    Ok(DecodedActivity {
        samples,
        max_heart_rate,
    })
}

/// Sanitized activity identifier from a file path, as used in the CSV rows.
pub fn activity_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "activity".to_owned());
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn lap_window(message: &fitparser::FitDataRecord) -> Option<LapWindow> {
    let start = field_timestamp(message, "start_time")?;
    let end = field_timestamp(message, "timestamp")?;
    Some(LapWindow { start, end })
}

/// 1-based index of the first lap window containing the timestamp.
fn current_lap(windows: &[LapWindow], timestamp: OffsetDateTime) -> Option<u32> {
    windows
        .iter()
        .position(|w| timestamp >= w.start && timestamp <= w.end)
        .map(|index| index as u32 + 1)
}

fn position_from_semicircles(message: &fitparser::FitDataRecord) -> Option<Position> {
    let lat = field_semicircles(message, "position_lat")?;
    let lon = field_semicircles(message, "position_long")?;
    Some(Position::new(lat, lon))
}

fn field_semicircles(message: &fitparser::FitDataRecord, name: &str) -> Option<f64> {
    message.fields().iter().find_map(|field| {
        if field.name() != name {
            return None;
        }
        match field.value() {
            fitparser::Value::SInt32(v) => Some(semicircles_to_degrees(*v)),
            _ => None,
        }
    })
}

fn field_timestamp(message: &fitparser::FitDataRecord, name: &str) -> Option<OffsetDateTime> {
    message.fields().iter().find_map(|field| {
        if field.name() != name {
            return None;
        }
        match field.value() {
            fitparser::Value::Timestamp(t) => Some(chrono_to_offset_datetime_local(t)),
            _ => None,
        }
    })
}

fn field_i32(message: &fitparser::FitDataRecord, name: &str) -> Option<i32> {
    message
        .fields()
        .iter()
        .find(|field| field.name() == name)
        .and_then(|field| extract_fit_i32(field.value()))
}

fn field_f64(message: &fitparser::FitDataRecord, name: &str) -> Option<f64> {
    message
        .fields()
        .iter()
        .find(|field| field.name() == name)
        .and_then(|field| extract_fit_f64(field.value()))
}

/// Convert FIT semicircles to degrees.
/// FIT stores lat/lon as semicircles where 2^31 semicircles = 180 degrees.
fn semicircles_to_degrees(semicircles: i32) -> f64 {
    (semicircles as f64) * (180.0 / 2_147_483_648.0)
}

/// Convert chrono DateTime<Utc> to time OffsetDateTime.
fn chrono_to_offset_datetime_utc(dt: &chrono::DateTime<chrono::Utc>) -> OffsetDateTime {
    let ts = dt.timestamp();
    let ns = dt.timestamp_subsec_nanos();

    OffsetDateTime::from_unix_timestamp(ts)
        .map(|odt| odt.replace_nanosecond(ns).unwrap_or(odt))
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Convert chrono DateTime<Local> to time OffsetDateTime.
fn chrono_to_offset_datetime_local(dt: &chrono::DateTime<chrono::Local>) -> OffsetDateTime {
    use chrono::Utc;
    let utc_dt = dt.with_timezone(&Utc);
    chrono_to_offset_datetime_utc(&utc_dt)
}

/// Extract i32 from the numeric FIT value types.
fn extract_fit_i32(value: &fitparser::Value) -> Option<i32> {
    match value {
        fitparser::Value::SInt8(v) => Some(i32::from(*v)),
        fitparser::Value::UInt8(v) => Some(i32::from(*v)),
        fitparser::Value::SInt16(v) => Some(i32::from(*v)),
        fitparser::Value::UInt16(v) => Some(i32::from(*v)),
        fitparser::Value::SInt32(v) => Some(*v),
        fitparser::Value::UInt32(v) => Some(*v as i32),
        _ => None,
    }
}

/// Extract f64 from the numeric FIT value types.
fn extract_fit_f64(value: &fitparser::Value) -> Option<f64> {
    match value {
        fitparser::Value::Float32(v) => Some(f64::from(*v)),
        fitparser::Value::Float64(v) => Some(*v),
        fitparser::Value::SInt8(v) => Some(f64::from(*v)),
        fitparser::Value::UInt8(v) => Some(f64::from(*v)),
        fitparser::Value::SInt16(v) => Some(f64::from(*v)),
        fitparser::Value::UInt16(v) => Some(f64::from(*v)),
        fitparser::Value::SInt32(v) => Some(f64::from(*v)),
        fitparser::Value::UInt32(v) => Some(f64::from(*v)),
        _ => None,
    }
}
