/// Live-data and actuator-command document decoding.
///
/// The device publishes one "live" document with every sensor's latest
/// value, and one "commands" document holding each actuator's mode. This
/// module turns those documents into `Reading`s and `AutomationModes`.
///
/// # Decoding policy
/// - A missing or `null` sensor field means *no reading* for that sensor in
///   this cycle. It is never defaulted to 0.0, which would classify as a
///   real (and often Critical) value.
/// - `floatTriggered` maps to 1.0 (low water) or 0.0.
/// - A missing `timestamp` (epoch milliseconds) falls back to the clock the
///   caller supplies.
/// - In the commands document, a missing `isAuto` means automatic, and
///   actuators the core does not know about are ignored.

use crate::alert::engine::AutomationModes;
use crate::model::{Reading, SensorKind, ALL_ACTUATORS, ALL_SENSOR_KINDS};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Live snapshot
// ============================================================================

/// The device's live-data document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub air_humidity: Option<f64>,
    pub air_temp: Option<f64>,
    pub dissolved_oxygen: Option<f64>,
    pub float_triggered: Option<bool>,
    #[serde(rename = "pH")]
    pub ph: Option<f64>,
    #[serde(rename = "turbidityNTU")]
    pub turbidity_ntu: Option<f64>,
    pub water_temp: Option<f64>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl LiveSnapshot {
    /// Value reported for `kind`, if present in this snapshot.
    pub fn value_for(&self, kind: SensorKind) -> Option<f64> {
        match kind {
            SensorKind::Ph => self.ph,
            SensorKind::WaterTemperature => self.water_temp,
            SensorKind::AirTemperature => self.air_temp,
            SensorKind::Humidity => self.air_humidity,
            SensorKind::DissolvedOxygen => self.dissolved_oxygen,
            SensorKind::Turbidity => self.turbidity_ntu,
            SensorKind::FloatSwitch => self.float_triggered.map(|t| if t { 1.0 } else { 0.0 }),
        }
    }

    /// One reading per sensor present in the snapshot, in dashboard order.
    pub fn readings(&self, fallback_now: DateTime<Utc>) -> Vec<Reading> {
        let timestamp = self.timestamp.unwrap_or(fallback_now);
        ALL_SENSOR_KINDS
            .into_iter()
            .filter_map(|kind| self.value_for(kind).map(|v| Reading::new(kind, v, timestamp)))
            .collect()
    }
}

pub fn parse_snapshot(json: &str) -> Result<LiveSnapshot, DecodeError> {
    serde_json::from_str(json).map_err(|e| DecodeError::InvalidJson(e.to_string()))
}

// ============================================================================
// Actuator commands
// ============================================================================

fn default_true() -> bool {
    true
}

/// One actuator entry in the commands document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActuatorCommand {
    #[serde(rename = "isAuto", default = "default_true")]
    pub is_auto: bool,
    #[serde(default)]
    pub value: bool,
}

/// The commands document, keyed by actuator (`fan`, `heater`, `pump`, ...).
pub type CommandDocument = HashMap<String, ActuatorCommand>;

pub fn parse_commands(json: &str) -> Result<CommandDocument, DecodeError> {
    serde_json::from_str(json).map_err(|e| DecodeError::InvalidJson(e.to_string()))
}

/// Collects the mode of every known actuator present in `commands`.
///
/// Actuators missing from the document fall back to the engine's
/// "automatic" default.
pub fn automation_modes(commands: &CommandDocument) -> AutomationModes {
    let mut modes = AutomationModes::new();
    for actuator in ALL_ACTUATORS {
        if let Some(command) = commands.get(actuator.key()) {
            modes.set_actuator(actuator, command.is_auto);
        }
    }
    modes
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, PartialEq)]
pub enum DecodeError {
    /// The document is not valid JSON or has a field of the wrong type.
    InvalidJson(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidJson(msg) => write!(f, "Invalid document: {}", msg),
        }
    }
}

impl std::error::Error for DecodeError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Actuator;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_full_snapshot_yields_one_reading_per_sensor() {
        let json = r#"{
            "airHumidity": 62.0, "airTemp": 24.5, "dissolvedOxygen": 6.8,
            "floatTriggered": false, "pH": 7.1, "turbidityNTU": 12,
            "waterTemp": 27.3, "timestamp": 1714568400000
        }"#;
        let snapshot = parse_snapshot(json).expect("valid snapshot");
        let readings = snapshot.readings(fixed_now() + chrono::Duration::hours(1));

        assert_eq!(readings.len(), 7);
        assert!(readings.iter().all(|r| r.timestamp == fixed_now()));
        let turbidity = readings.iter().find(|r| r.kind == SensorKind::Turbidity).unwrap();
        assert_eq!(turbidity.value, 12.0);
        let float = readings.iter().find(|r| r.kind == SensorKind::FloatSwitch).unwrap();
        assert_eq!(float.value, 0.0);
    }

    #[test]
    fn test_missing_fields_produce_no_reading_not_zero() {
        let snapshot = parse_snapshot(r#"{ "pH": 7.9, "waterTemp": null }"#).unwrap();
        let readings = snapshot.readings(fixed_now());
        assert_eq!(readings.len(), 1, "only pH was reported: {:?}", readings);
        assert_eq!(readings[0].kind, SensorKind::Ph);
        assert_eq!(readings[0].timestamp, fixed_now(), "missing timestamp uses fallback clock");
    }

    #[test]
    fn test_triggered_float_switch_is_one() {
        let snapshot = parse_snapshot(r#"{ "floatTriggered": true }"#).unwrap();
        assert_eq!(snapshot.value_for(SensorKind::FloatSwitch), Some(1.0));
    }

    #[test]
    fn test_wrong_field_type_is_an_error() {
        let err = parse_snapshot(r#"{ "pH": "seven" }"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson(_)));
    }

    #[test]
    fn test_commands_map_to_actuator_automation() {
        let json = r#"{
            "fan":    { "isAuto": false, "value": true },
            "heater": { "isAuto": true,  "value": false },
            "valve":  { "value": false },
            "light":  { "isAuto": false, "value": true }
        }"#;
        let modes = automation_modes(&parse_commands(json).unwrap());

        assert_eq!(modes.actuator_mode(Actuator::Fan), Some(false));
        assert_eq!(modes.actuator_mode(Actuator::Heater), Some(true));
        assert_eq!(modes.actuator_mode(Actuator::Valve), Some(true), "missing isAuto means auto");
        assert_eq!(modes.actuator_mode(Actuator::WaterPump), None, "pump not present");

        assert!(!modes.is_automatic(SensorKind::Humidity, SensorKind::Humidity.actuator(true)));
        assert!(!modes.is_automatic(SensorKind::AirTemperature, SensorKind::AirTemperature.actuator(false)));
        assert!(modes.is_automatic(SensorKind::DissolvedOxygen, None));
    }

    #[test]
    fn test_water_temperature_automation_depends_on_direction() {
        let json = r#"{
            "fan":    { "isAuto": false, "value": false },
            "heater": { "isAuto": true,  "value": false }
        }"#;
        let modes = automation_modes(&parse_commands(json).unwrap());
        let kind = SensorKind::WaterTemperature;
        assert!(!modes.is_automatic(kind, kind.actuator(true)), "hot water relies on the manual fan");
        assert!(modes.is_automatic(kind, kind.actuator(false)), "cold water relies on the automatic heater");
    }
}
