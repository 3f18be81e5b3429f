//! Target TCX document builder.
//!
//! Emits the enhanced activity in the target ecosystem's dialect: every
//! trackpoint carries the synthesized speed and cadence in an
//! `ns3:TPX` extension block, and each lap's `MaximumSpeed` and `Cadence`
//! are the aggregates recomputed from the synthesized track.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use trackdata::types::{EnhancedActivity, EnhancedLap, EnhancedTrackpoint};

use super::TcxError;

const NS_TCX: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
const NS_TPX: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2 http://www.garmin.com/xmlschemas/TrainingCenterDatabasev2.xsd";

/// The device block the target ecosystem expects to see.
struct DeviceCreator {
    name: &'static str,
    unit_id: u64,
    product_id: u32,
    version: [u32; 4],
}

const CREATOR: DeviceCreator = DeviceCreator {
    name: "Forerunner 645 Music",
    unit_id: 3966577896,
    product_id: 2888,
    version: [7, 20, 0, 0],
};

/// Builds the complete target TCX document for one enhanced activity.
pub fn write_activity(activity: &EnhancedActivity) -> Result<String, TcxError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(build_err)?;

    let mut root = BytesStart::new("TrainingCenterDatabase");
    root.push_attribute(("xmlns", NS_TCX));
    root.push_attribute(("xmlns:ns3", NS_TPX));
    root.push_attribute(("xmlns:xsi", NS_XSI));
    root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
    writer.write_event(Event::Start(root)).map_err(build_err)?;

    writer
        .write_event(Event::Start(BytesStart::new("Activities")))
        .map_err(build_err)?;

    let mut activity_el = BytesStart::new("Activity");
    activity_el.push_attribute(("Sport", activity.sport.as_str()));
    writer
        .write_event(Event::Start(activity_el))
        .map_err(build_err)?;

    write_element(&mut writer, "Id", &activity.id)?;

    for lap in &activity.laps {
        write_lap(&mut writer, lap)?;
    }

    write_creator(&mut writer)?;

    writer
        .write_event(Event::End(BytesEnd::new("Activity")))
        .map_err(build_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("Activities")))
        .map_err(build_err)?;

    write_author(&mut writer)?;

    writer
        .write_event(Event::End(BytesEnd::new("TrainingCenterDatabase")))
        .map_err(build_err)?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| TcxError::Build(e.to_string()))
}

fn write_lap<W: std::io::Write>(
    writer: &mut Writer<W>,
    lap: &EnhancedLap,
) -> Result<(), TcxError> {
    let mut lap_el = BytesStart::new("Lap");
    lap_el.push_attribute(("StartTime", rfc3339(lap.start_time)?.as_str()));
    writer.write_event(Event::Start(lap_el)).map_err(build_err)?;

    write_element(writer, "TotalTimeSeconds", &format!("{}", lap.total_time_seconds))?;
    write_element(writer, "DistanceMeters", &format!("{:.2}", lap.distance_m))?;
    write_element(
        writer,
        "MaximumSpeed",
        &format!("{:.3}", lap.maximum_speed_mps),
    )?;
    write_element(writer, "Calories", &lap.calories.to_string())?;
    write_heart_rate_element(writer, "AverageHeartRateBpm", lap.average_heart_rate)?;
    write_heart_rate_element(writer, "MaximumHeartRateBpm", lap.maximum_heart_rate)?;
    write_element(writer, "Intensity", &lap.intensity)?;
    write_element(writer, "Cadence", &lap.cadence_rpm.to_string())?;
    write_element(writer, "TriggerMethod", &lap.trigger_method)?;

    writer
        .write_event(Event::Start(BytesStart::new("Track")))
        .map_err(build_err)?;
    for trackpoint in &lap.trackpoints {
        write_trackpoint(writer, trackpoint)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Track")))
        .map_err(build_err)?;

    writer
        .write_event(Event::End(BytesEnd::new("Lap")))
        .map_err(build_err)?;

    Ok(())
}

fn write_trackpoint<W: std::io::Write>(
    writer: &mut Writer<W>,
    tp: &EnhancedTrackpoint,
) -> Result<(), TcxError> {
    writer
        .write_event(Event::Start(BytesStart::new("Trackpoint")))
        .map_err(build_err)?;

    write_element(writer, "Time", &rfc3339(tp.time)?)?;

    writer
        .write_event(Event::Start(BytesStart::new("Position")))
        .map_err(build_err)?;
    write_element(
        writer,
        "LatitudeDegrees",
        &format!("{:.6}", tp.position.latitude),
    )?;
    write_element(
        writer,
        "LongitudeDegrees",
        &format!("{:.6}", tp.position.longitude),
    )?;
    writer
        .write_event(Event::End(BytesEnd::new("Position")))
        .map_err(build_err)?;

    write_element(writer, "AltitudeMeters", &format!("{:.1}", tp.altitude_m))?;
    write_element(writer, "DistanceMeters", &format!("{:.2}", tp.distance_m))?;

    if let Some(hr) = tp.heart_rate {
        write_heart_rate_element(writer, "HeartRateBpm", hr)?;
    }

    writer
        .write_event(Event::Start(BytesStart::new("Extensions")))
        .map_err(build_err)?;
    let mut tpx = BytesStart::new("ns3:TPX");
    tpx.push_attribute(("xmlns:ns3", NS_TPX));
    writer.write_event(Event::Start(tpx)).map_err(build_err)?;
    write_element(writer, "ns3:Speed", &format!("{:.3}", tp.speed_mps))?;
    write_element(writer, "ns3:CadenceRPM", &tp.cadence_rpm.to_string())?;
    writer
        .write_event(Event::End(BytesEnd::new("ns3:TPX")))
        .map_err(build_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("Extensions")))
        .map_err(build_err)?;

    writer
        .write_event(Event::End(BytesEnd::new("Trackpoint")))
        .map_err(build_err)?;

    Ok(())
}

fn write_creator<W: std::io::Write>(writer: &mut Writer<W>) -> Result<(), TcxError> {
    let mut creator = BytesStart::new("Creator");
    creator.push_attribute(("xsi:type", "Device_t"));
    writer
        .write_event(Event::Start(creator))
        .map_err(build_err)?;

    write_element(writer, "Name", CREATOR.name)?;
    write_element(writer, "UnitId", &CREATOR.unit_id.to_string())?;
    write_element(writer, "ProductID", &CREATOR.product_id.to_string())?;
    write_version(writer, CREATOR.version)?;

    writer
        .write_event(Event::End(BytesEnd::new("Creator")))
        .map_err(build_err)?;
    Ok(())
}

fn write_author<W: std::io::Write>(writer: &mut Writer<W>) -> Result<(), TcxError> {
    let mut author = BytesStart::new("Author");
    author.push_attribute(("xsi:type", "Application_t"));
    writer
        .write_event(Event::Start(author))
        .map_err(build_err)?;

    write_element(writer, "Name", "Connect Api")?;

    writer
        .write_event(Event::Start(BytesStart::new("Build")))
        .map_err(build_err)?;
    write_version(writer, [25, 13, 0, 0])?;
    writer
        .write_event(Event::End(BytesEnd::new("Build")))
        .map_err(build_err)?;

    write_element(writer, "LangID", "en")?;
    write_element(writer, "PartNumber", "006-D2449-00")?;

    writer
        .write_event(Event::End(BytesEnd::new("Author")))
        .map_err(build_err)?;
    Ok(())
}

fn write_version<W: std::io::Write>(
    writer: &mut Writer<W>,
    version: [u32; 4],
) -> Result<(), TcxError> {
    writer
        .write_event(Event::Start(BytesStart::new("Version")))
        .map_err(build_err)?;
    write_element(writer, "VersionMajor", &version[0].to_string())?;
    write_element(writer, "VersionMinor", &version[1].to_string())?;
    write_element(writer, "BuildMajor", &version[2].to_string())?;
    write_element(writer, "BuildMinor", &version[3].to_string())?;
    writer
        .write_event(Event::End(BytesEnd::new("Version")))
        .map_err(build_err)?;
    Ok(())
}

fn write_heart_rate_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: i32,
) -> Result<(), TcxError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(build_err)?;
    write_element(writer, "Value", &value.to_string())?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(build_err)?;
    Ok(())
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), TcxError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(build_err)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(build_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(build_err)?;
    Ok(())
}

fn rfc3339(timestamp: OffsetDateTime) -> Result<String, TcxError> {
    timestamp
        .format(&Rfc3339)
        .map_err(|e| TcxError::Build(e.to_string()))
}

fn build_err(error: impl std::fmt::Display) -> TcxError {
    TcxError::Build(error.to_string())
}
