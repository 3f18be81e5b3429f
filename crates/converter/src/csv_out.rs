//! Flat CSV serialization of engineered samples.
//!
//! One row per sample, one fixed column order. Missing values serialize as
//! empty fields and flags as `1`/`0` so the output loads cleanly into
//! dataframe tooling.

use std::io::Write;

use time::format_description::well_known::Rfc3339;

use trackdata::types::ActivitySample;

/// Column order of the training-data output.
pub const HEADERS: [&str; 23] = [
    "timestamp",
    "activity_id",
    "seconds_into_activity",
    "heart_rate",
    "speed_mps",
    "pace_min_per_km",
    "distance_m",
    "altitude_m",
    "grade_percent",
    "cadence_rpm",
    "power_watts",
    "temperature_c",
    "lap_number",
    "position_lat",
    "position_long",
    "hr_zone",
    "speed_zone",
    "elevation_change_mps",
    "hr_lag_5s",
    "hr_lag_10s",
    "speed_smoothed_10s",
    "is_uphill",
    "is_interval",
];

/// Error type for CSV serialization failures.
#[derive(Debug, thiserror::Error)]
pub enum CsvWriteError {
    #[error("failed to write CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Writes the header row.
pub fn write_header<W: Write>(writer: &mut csv::Writer<W>) -> Result<(), CsvWriteError> {
    writer.write_record(HEADERS)?;
    Ok(())
}

/// Writes one row per sample, tagged with the activity identifier.
pub fn write_samples<W: Write>(
    writer: &mut csv::Writer<W>,
    activity_id: &str,
    samples: &[ActivitySample],
) -> Result<(), CsvWriteError> {
    for sample in samples {
        let features = &sample.features;
        writer.write_record([
            sample.timestamp.format(&Rfc3339)?,
            activity_id.to_owned(),
            sample.elapsed_seconds.to_string(),
            number(sample.heart_rate),
            number(sample.speed_mps),
            number(features.pace_min_per_km),
            number(sample.distance_m),
            number(sample.altitude_m),
            number(features.grade_percent),
            number(sample.cadence_rpm),
            number(sample.power_watts),
            number(sample.temperature_c),
            number(sample.lap_number),
            number(sample.position.map(|p| p.latitude)),
            number(sample.position.map(|p| p.longitude)),
            number(features.hr_zone),
            number(features.speed_zone),
            number(features.elevation_change_mps),
            number(features.hr_lag_5s),
            number(features.hr_lag_10s),
            number(features.speed_smoothed),
            flag(features.is_uphill),
            flag(features.is_interval),
        ])?;
    }
    Ok(())
}

/// Optional numeric field: empty when missing.
fn number<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Optional boolean field: `1`/`0`, empty when missing.
fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "1".to_owned(),
        Some(false) => "0".to_owned(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use trackdata::types::Position;

    fn sample() -> ActivitySample {
        let mut sample = ActivitySample::new(datetime!(2023-04-01 09:00:05 UTC), 5);
        sample.heart_rate = Some(142);
        sample.speed_mps = Some(3.5);
        sample.lap_number = Some(1);
        sample.position = Some(Position::new(44.9708, -93.2930));
        sample.features.hr_zone = Some(3);
        sample.features.is_uphill = Some(true);
        sample.features.is_interval = Some(false);
        sample
    }

    fn rendered(samples: &[ActivitySample]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        write_header(&mut writer).unwrap();
        write_samples(&mut writer, "morning_run", samples).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_header_row() {
        let output = rendered(&[]);
        let header = output.lines().next().unwrap();
        assert!(header.starts_with("timestamp,activity_id,seconds_into_activity"));
        assert!(header.ends_with("is_uphill,is_interval"));
        assert_eq!(header.split(',').count(), HEADERS.len());
    }

    #[test]
    fn test_row_values() {
        let output = rendered(&[sample()]);
        let row = output.lines().nth(1).unwrap();
        let cells: Vec<&str> = row.split(',').collect();

        assert_eq!(cells.len(), HEADERS.len());
        assert_eq!(cells[0], "2023-04-01T09:00:05Z");
        assert_eq!(cells[1], "morning_run");
        assert_eq!(cells[2], "5");
        assert_eq!(cells[3], "142");
        assert_eq!(cells[4], "3.5");
        // No pace was derived for this sample.
        assert_eq!(cells[5], "");
        assert_eq!(cells[12], "1");
        assert_eq!(cells[13], "44.9708");
        assert_eq!(cells[21], "1");
        assert_eq!(cells[22], "0");
    }

    #[test]
    fn test_missing_values_are_empty_fields() {
        let bare = ActivitySample::new(datetime!(2023-04-01 09:00:00 UTC), 0);
        let output = rendered(&[bare]);
        let row = output.lines().nth(1).unwrap();
        let cells: Vec<&str> = row.split(',').collect();

        assert_eq!(cells[3], "");
        assert_eq!(cells[21], "");
        assert_eq!(cells[22], "");
    }
}
