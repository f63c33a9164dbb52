//! SDS Sample Data
//!
//! Type definitions, stream names and tank readings used by the sample run.
//! Zero readings stand for missing measurements and are ingested as data.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use chrono::{DateTime, Utc};
use sds_common::utils::parse_timestamp;
use sds_common::{Event, PropertyDefinition, Result, TypeCode, TypeDefinition};

pub const TYPE_VALUE_TIME: &str = "Value_Time";
pub const TYPE_PRESSURE_TEMP_TIME: &str = "Pressure_Temp_Time";

pub const STREAM_PRESSURE: &str = "Pressure_Tank1";
pub const STREAM_TEMPERATURE: &str = "Temperature_Tank1";
pub const STREAM_VESSEL: &str = "Vessel";
pub const STREAM_TANK_1: &str = "Tank1";
pub const STREAM_TANK_2: &str = "Tank2";

const TANK_1: [(f64, f64, &str); 8] = [
    (346.0, 91.0, "2017-01-11T22:21:23.430Z"),
    (0.0, 0.0, "2017-01-11T22:22:23.430Z"),
    (386.0, 93.0, "2017-01-11T22:24:23.430Z"),
    (385.0, 92.0, "2017-01-11T22:25:23.430Z"),
    (385.0, 0.0, "2017-01-11T22:28:23.430Z"),
    (384.2, 92.0, "2017-01-11T22:26:23.430Z"),
    (384.2, 92.2, "2017-01-11T22:27:23.430Z"),
    (390.0, 0.0, "2017-01-11T22:28:29.430Z"),
];

const TANK_2: [(f64, f64, &str); 7] = [
    (345.0, 89.0, "2017-01-11T22:20:23.430Z"),
    (356.0, 0.0, "2017-01-11T22:21:23.430Z"),
    (354.0, 88.0, "2017-01-11T22:22:23.430Z"),
    (374.0, 87.0, "2017-01-11T22:28:23.430Z"),
    (384.5, 88.0, "2017-01-11T22:26:23.430Z"),
    (384.2, 92.2, "2017-01-11T22:27:23.430Z"),
    (390.0, 87.0, "2017-01-11T22:28:29.430Z"),
];

// =============================================================================
// Types
// =============================================================================

/// Single value indexed by time.
pub fn value_time_type() -> TypeDefinition {
    TypeDefinition::new(TYPE_VALUE_TIME)
        .with_description("A Time-Series indexed type with a value")
        .with_property(PropertyDefinition::value("value", TypeCode::Double))
        .with_property(PropertyDefinition::key("time"))
}

/// Tank pressure and temperature indexed by time.
pub fn pressure_temp_time_type() -> TypeDefinition {
    TypeDefinition::new(TYPE_PRESSURE_TEMP_TIME)
        .with_description("A Time-Series indexed type with 2 values")
        .with_property(PropertyDefinition::value("temperature", TypeCode::Double))
        .with_property(PropertyDefinition::value("pressure", TypeCode::Double))
        .with_property(PropertyDefinition::key("time"))
}

// =============================================================================
// Readings
// =============================================================================

/// One tank measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankReading {
    pub pressure: f64,
    pub temperature: f64,
    pub time: DateTime<Utc>,
}

impl TankReading {
    pub fn to_event(&self) -> Event {
        Event::new()
            .with("pressure", self.pressure)
            .with("temperature", self.temperature)
            .with("time", self.time)
    }
}

fn readings(table: &[(f64, f64, &str)]) -> Result<Vec<TankReading>> {
    table
        .iter()
        .map(|&(pressure, temperature, time)| {
            Ok(TankReading {
                pressure,
                temperature,
                time: parse_timestamp(time)?,
            })
        })
        .collect()
}

/// Readings of the first tank, in arrival order.
pub fn tank_1_readings() -> Result<Vec<TankReading>> {
    readings(&TANK_1)
}

/// Readings of the second tank, in arrival order.
pub fn tank_2_readings() -> Result<Vec<TankReading>> {
    readings(&TANK_2)
}

pub fn tank_events(readings: &[TankReading]) -> Vec<Event> {
    readings.iter().map(TankReading::to_event).collect()
}

/// Pressure readings projected onto the value/time type.
pub fn pressure_events(readings: &[TankReading]) -> Vec<Event> {
    readings
        .iter()
        .map(|r| Event::new().with("value", r.pressure).with("time", r.time))
        .collect()
}

/// Temperature readings projected onto the value/time type.
pub fn temperature_events(readings: &[TankReading]) -> Vec<Event> {
    readings
        .iter()
        .map(|r| Event::new().with("value", r.temperature).with("time", r.time))
        .collect()
}

/// Earliest and latest reading time.
pub fn time_span(readings: &[TankReading]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = readings.iter().map(|r| r.time).min()?;
    let last = readings.iter().map(|r| r.time).max()?;
    Some((first, last))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_valid() {
        assert!(value_time_type().validate().is_ok());
        assert!(pressure_temp_time_type().validate().is_ok());
    }

    #[test]
    fn test_time_span_ignores_arrival_order() {
        let readings = tank_1_readings().expect("timestamps parse");
        let (first, last) = time_span(&readings).expect("non-empty");
        assert_eq!(first, parse_timestamp("2017-01-11T22:21:23.430Z").expect("parse"));
        assert_eq!(last, parse_timestamp("2017-01-11T22:28:29.430Z").expect("parse"));
        assert_eq!(time_span(&[]), None);
    }

    #[test]
    fn test_projections() {
        let readings = tank_2_readings().expect("timestamps parse");
        let pressures = pressure_events(&readings);
        assert_eq!(pressures.len(), 7);
        assert_eq!(pressures[0].number("value"), Some(345.0));
        assert_eq!(temperature_events(&readings)[1].number("value"), Some(0.0));
        assert_eq!(tank_events(&readings)[0].len(), 3);
    }
}
