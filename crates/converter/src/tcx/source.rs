//! Source TCX parsing with strict schema validation.
//!
//! The document must contain exactly one `Activity` with a non-empty `Id`;
//! anything else is rejected loudly rather than silently producing a wrong
//! conversion. Individual trackpoint fields stay optional — filling those
//! gaps is the synthesizer's job.

use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use trackdata::types::{Position, SourceActivity, SourceLap, SourceTrackpoint};

use super::TcxError;

/// Parses and validates a source TCX document.
pub fn parse_source_activity(xml: &str) -> Result<SourceActivity, TcxError> {
    let document: TrainingCenterDatabase =
        quick_xml::de::from_str(xml).map_err(|e| TcxError::Parse(e.to_string()))?;

    let mut activities = document
        .activities
        .map(|a| a.activities)
        .unwrap_or_default();

    match activities.len() {
        0 => return Err(TcxError::NoActivities),
        1 => {}
        n => return Err(TcxError::MultipleActivities(n)),
    }
    let activity = activities.remove(0);

    let id = activity
        .id
        .map(|id| id.trim().to_owned())
        .filter(|id| !id.is_empty())
        .ok_or(TcxError::MissingActivityId)?;

    Ok(SourceActivity {
        id,
        sport: activity.sport.unwrap_or_else(|| "Running".to_owned()),
        laps: activity.laps.into_iter().map(convert_lap).collect(),
    })
}

fn convert_lap(lap: Lap) -> SourceLap {
    SourceLap {
        start_time: lap.start_time.as_deref().and_then(parse_rfc3339),
        total_time_seconds: lap.total_time_seconds,
        distance_m: lap.distance_meters,
        calories: lap.calories,
        average_heart_rate: lap.average_heart_rate.map(|hr| hr.value),
        maximum_heart_rate: lap.maximum_heart_rate.map(|hr| hr.value),
        intensity: lap.intensity,
        trigger_method: lap.trigger_method,
        trackpoints: lap
            .tracks
            .into_iter()
            .flat_map(|track| track.trackpoints)
            .map(convert_trackpoint)
            .collect(),
    }
}

fn convert_trackpoint(tp: Trackpoint) -> SourceTrackpoint {
    SourceTrackpoint {
        time: tp.time.as_deref().and_then(parse_rfc3339),
        position: tp
            .position
            .map(|p| Position::new(p.latitude_degrees, p.longitude_degrees)),
        altitude_m: tp.altitude_meters,
        distance_m: tp.distance_meters,
        heart_rate: tp.heart_rate.map(|hr| hr.value),
        cadence_rpm: tp.cadence,
    }
}

fn parse_rfc3339(value: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

// Source document structures.

#[derive(Debug, Deserialize)]
#[serde(rename = "TrainingCenterDatabase")]
struct TrainingCenterDatabase {
    #[serde(rename = "Activities")]
    activities: Option<Activities>,
}

#[derive(Debug, Deserialize)]
struct Activities {
    #[serde(rename = "Activity", default)]
    activities: Vec<Activity>,
}

#[derive(Debug, Deserialize)]
struct Activity {
    #[serde(rename = "@Sport")]
    sport: Option<String>,
    #[serde(rename = "Id")]
    id: Option<String>,
    #[serde(rename = "Lap", default)]
    laps: Vec<Lap>,
}

#[derive(Debug, Deserialize)]
struct Lap {
    #[serde(rename = "@StartTime")]
    start_time: Option<String>,
    #[serde(rename = "TotalTimeSeconds")]
    total_time_seconds: Option<f64>,
    #[serde(rename = "DistanceMeters")]
    distance_meters: Option<f64>,
    #[serde(rename = "Calories")]
    calories: Option<u32>,
    #[serde(rename = "AverageHeartRateBpm")]
    average_heart_rate: Option<HeartRateBpm>,
    #[serde(rename = "MaximumHeartRateBpm")]
    maximum_heart_rate: Option<HeartRateBpm>,
    #[serde(rename = "Intensity")]
    intensity: Option<String>,
    #[serde(rename = "TriggerMethod")]
    trigger_method: Option<String>,
    #[serde(rename = "Track", default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    #[serde(rename = "Trackpoint", default)]
    trackpoints: Vec<Trackpoint>,
}

#[derive(Debug, Deserialize)]
struct Trackpoint {
    #[serde(rename = "Time")]
    time: Option<String>,
    #[serde(rename = "Position")]
    position: Option<TrackpointPosition>,
    #[serde(rename = "AltitudeMeters")]
    altitude_meters: Option<f64>,
    #[serde(rename = "DistanceMeters")]
    distance_meters: Option<f64>,
    #[serde(rename = "HeartRateBpm")]
    heart_rate: Option<HeartRateBpm>,
    #[serde(rename = "Cadence")]
    cadence: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct TrackpointPosition {
    #[serde(rename = "LatitudeDegrees")]
    latitude_degrees: f64,
    #[serde(rename = "LongitudeDegrees")]
    longitude_degrees: f64,
}

#[derive(Debug, Deserialize)]
struct HeartRateBpm {
    #[serde(rename = "Value")]
    value: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2">
  <Activities>
    <Activity Sport="Running">
      <Id>2023-04-01T09:00:00Z</Id>
      <Lap StartTime="2023-04-01T09:00:00Z">
        <TotalTimeSeconds>120</TotalTimeSeconds>
        <DistanceMeters>0</DistanceMeters>
        <Calories>35</Calories>
        <AverageHeartRateBpm><Value>128</Value></AverageHeartRateBpm>
        <MaximumHeartRateBpm><Value>161</Value></MaximumHeartRateBpm>
        <Intensity>Active</Intensity>
        <TriggerMethod>Manual</TriggerMethod>
        <Track>
          <Trackpoint>
            <Time>2023-04-01T09:00:00Z</Time>
            <HeartRateBpm><Value>120</Value></HeartRateBpm>
          </Trackpoint>
          <Trackpoint>
            <Time>2023-04-01T09:00:01Z</Time>
            <HeartRateBpm><Value>135</Value></HeartRateBpm>
            <Cadence>82</Cadence>
          </Trackpoint>
        </Track>
      </Lap>
      <Lap StartTime="2023-04-01T09:02:00Z">
        <TotalTimeSeconds>60</TotalTimeSeconds>
        <Track>
          <Trackpoint>
            <Time>2023-04-01T09:02:00Z</Time>
            <HeartRateBpm><Value>150</Value></HeartRateBpm>
          </Trackpoint>
        </Track>
      </Lap>
    </Activity>
  </Activities>
</TrainingCenterDatabase>"#;

    #[test]
    fn test_parse_sample_document() {
        let activity = parse_source_activity(SAMPLE_TCX).unwrap();

        assert_eq!(activity.id, "2023-04-01T09:00:00Z");
        assert_eq!(activity.sport, "Running");
        assert_eq!(activity.laps.len(), 2);

        let lap = &activity.laps[0];
        assert_eq!(lap.total_time_seconds, Some(120.0));
        assert_eq!(lap.calories, Some(35));
        assert_eq!(lap.average_heart_rate, Some(128));
        assert_eq!(lap.maximum_heart_rate, Some(161));
        assert_eq!(lap.trackpoints.len(), 2);
        assert_eq!(lap.trackpoints[0].heart_rate, Some(120));
        assert_eq!(lap.trackpoints[1].cadence_rpm, Some(82));
        assert!(lap.trackpoints[0].position.is_none());
        assert!(lap.start_time.is_some());

        // The second lap omits most summary fields.
        let lap = &activity.laps[1];
        assert_eq!(lap.calories, None);
        assert_eq!(lap.average_heart_rate, None);
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let xml = r#"<TrainingCenterDatabase><Activities>
            <Activity Sport="Running"><Lap></Lap></Activity>
        </Activities></TrainingCenterDatabase>"#;
        assert!(matches!(
            parse_source_activity(xml),
            Err(TcxError::MissingActivityId)
        ));
    }

    #[test]
    fn test_blank_id_is_rejected() {
        let xml = r#"<TrainingCenterDatabase><Activities>
            <Activity Sport="Running"><Id>  </Id></Activity>
        </Activities></TrainingCenterDatabase>"#;
        assert!(matches!(
            parse_source_activity(xml),
            Err(TcxError::MissingActivityId)
        ));
    }

    #[test]
    fn test_multiple_activities_are_rejected() {
        let xml = r#"<TrainingCenterDatabase><Activities>
            <Activity Sport="Running"><Id>a</Id></Activity>
            <Activity Sport="Running"><Id>b</Id></Activity>
        </Activities></TrainingCenterDatabase>"#;
        assert!(matches!(
            parse_source_activity(xml),
            Err(TcxError::MultipleActivities(2))
        ));
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let xml = r#"<TrainingCenterDatabase></TrainingCenterDatabase>"#;
        assert!(matches!(
            parse_source_activity(xml),
            Err(TcxError::NoActivities)
        ));
    }

    #[test]
    fn test_malformed_xml_is_a_parse_error() {
        assert!(matches!(
            parse_source_activity("<TrainingCenterDatabase"),
            Err(TcxError::Parse(_))
        ));
    }

    #[test]
    fn test_sport_defaults_to_running() {
        let xml = r#"<TrainingCenterDatabase><Activities>
            <Activity><Id>a</Id></Activity>
        </Activities></TrainingCenterDatabase>"#;
        let activity = parse_source_activity(xml).unwrap();
        assert_eq!(activity.sport, "Running");
    }
}
