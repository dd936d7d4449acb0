/// Core data types for the aquaponics alert service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O. The only logic here is naming: stable keys, display
/// labels, and the lenient decoding rules for values read back from storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Sensor kinds
// ---------------------------------------------------------------------------

/// Every sensor the monitoring rig reports.
///
/// Adding a variant forces a threshold entry, a classifier branch and a
/// guidance branch through exhaustive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    #[serde(rename = "ph")]
    Ph,
    #[serde(rename = "water_temp")]
    WaterTemperature,
    #[serde(rename = "air_temp")]
    AirTemperature,
    Humidity,
    DissolvedOxygen,
    Turbidity,
    FloatSwitch,
}

/// All kinds, in dashboard order.
pub const ALL_SENSOR_KINDS: [SensorKind; 7] = [
    SensorKind::Ph,
    SensorKind::WaterTemperature,
    SensorKind::AirTemperature,
    SensorKind::Humidity,
    SensorKind::DissolvedOxygen,
    SensorKind::Turbidity,
    SensorKind::FloatSwitch,
];

impl SensorKind {
    /// Stable key used in alert ids, store rows and config files.
    pub fn key(&self) -> &'static str {
        match self {
            SensorKind::Ph => "ph",
            SensorKind::WaterTemperature => "water_temp",
            SensorKind::AirTemperature => "air_temp",
            SensorKind::Humidity => "humidity",
            SensorKind::DissolvedOxygen => "dissolved_oxygen",
            SensorKind::Turbidity => "turbidity",
            SensorKind::FloatSwitch => "float_switch",
        }
    }

    /// Short label shown in alert titles.
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Ph => "pH",
            SensorKind::WaterTemperature => "Water Temp",
            SensorKind::AirTemperature => "Air Temp",
            SensorKind::Humidity => "Humidity",
            SensorKind::DissolvedOxygen => "Dissolved O₂",
            SensorKind::Turbidity => "Turbidity",
            SensorKind::FloatSwitch => "Water Level",
        }
    }

    /// The actuator that corrects this sensor's condition in auto mode.
    ///
    /// `above_ideal` picks the side of the ideal band: hot water is cooled
    /// by the fan, cold water is warmed by the heater. Dissolved oxygen and
    /// turbidity have no controlling actuator: the air pump runs
    /// continuously and clarity is a manual filter job.
    pub fn actuator(&self, above_ideal: bool) -> Option<Actuator> {
        match self {
            SensorKind::Ph => Some(Actuator::WaterPump),
            SensorKind::WaterTemperature if above_ideal => Some(Actuator::Fan),
            SensorKind::WaterTemperature => Some(Actuator::Heater),
            SensorKind::AirTemperature => Some(Actuator::Fan),
            SensorKind::Humidity => Some(Actuator::Fan),
            SensorKind::FloatSwitch => Some(Actuator::Valve),
            SensorKind::DissolvedOxygen | SensorKind::Turbidity => None,
        }
    }

    /// Parses a sensor name as the dashboard and device firmware spell it.
    ///
    /// Matching is case-insensitive and accepts the historical aliases
    /// (`temperature`, `do`, `oxygen`, ...). Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<SensorKind> {
        let normalized = name.trim().to_lowercase();
        match normalized.as_str() {
            "ph" => Some(SensorKind::Ph),
            "water_temp" | "watertemp" | "water temperature" | "water temp" | "temperature" => {
                Some(SensorKind::WaterTemperature)
            }
            "air_temp" | "airtemp" | "air temperature" | "air temp" => Some(SensorKind::AirTemperature),
            "humidity" | "humid" | "air_humidity" | "airhumidity" => Some(SensorKind::Humidity),
            "dissolved_oxygen" | "dissolved oxygen" | "do" | "oxygen" => Some(SensorKind::DissolvedOxygen),
            "turbidity" | "turbidityntu" => Some(SensorKind::Turbidity),
            "float_switch" | "floatswitch" | "float" | "water_level" => Some(SensorKind::FloatSwitch),
            _ => None,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Relay-driven devices on the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actuator {
    Fan,
    Heater,
    WaterPump,
    Valve,
}

pub const ALL_ACTUATORS: [Actuator; 4] = [
    Actuator::Fan,
    Actuator::Heater,
    Actuator::WaterPump,
    Actuator::Valve,
];

impl Actuator {
    /// Key used by the device command document (`commands/<device>/<key>`).
    pub fn key(&self) -> &'static str {
        match self {
            Actuator::Fan => "fan",
            Actuator::Heater => "heater",
            Actuator::WaterPump => "pump",
            Actuator::Valve => "valve",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Actuator::Fan => "ventilation fan",
            Actuator::Heater => "water heater",
            Actuator::WaterPump => "water pump",
            Actuator::Valve => "refill valve",
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity tiers, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Excellent,
    Good,
    Caution,
    Critical,
}

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Excellent => "excellent",
            SeverityTier::Good => "good",
            SeverityTier::Caution => "caution",
            SeverityTier::Critical => "critical",
        }
    }

    /// `true` for the two tiers that can raise an alert.
    pub fn is_alerting(&self) -> bool {
        matches!(self, SeverityTier::Caution | SeverityTier::Critical)
    }

    /// Decodes a stored tier name.
    ///
    /// Unknown or missing values decode to `Good` so a corrupted row can
    /// never suppress the next real escalation.
    pub fn from_stored(value: Option<&str>) -> SeverityTier {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("excellent") => SeverityTier::Excellent,
            Some("good") | Some("normal") => SeverityTier::Good,
            Some("caution") => SeverityTier::Caution,
            Some("critical") => SeverityTier::Critical,
            _ => SeverityTier::Good,
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Readings and per-sensor state
// ---------------------------------------------------------------------------

/// A single timestamped sensor measurement, as delivered by the device feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub kind: SensorKind,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(kind: SensorKind, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self { kind, value, timestamp }
    }
}

/// The "never alerted" sentinel: 1970-01-01T00:00:00Z.
pub fn epoch_zero() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Persisted transition state for one sensor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorState {
    pub last_tier: SeverityTier,
    pub last_alert_at: DateTime<Utc>,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            last_tier: SeverityTier::Good,
            last_alert_at: epoch_zero(),
        }
    }
}

// ---------------------------------------------------------------------------
// Alert records
// ---------------------------------------------------------------------------

/// The tier name carried by an alert. Only the two alerting tiers exist here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Caution,
    Critical,
}

impl AlertLevel {
    /// Maps an alerting tier to its label; `None` for Excellent and Good.
    pub fn from_tier(tier: SeverityTier) -> Option<AlertLevel> {
        match tier {
            SeverityTier::Critical => Some(AlertLevel::Critical),
            SeverityTier::Caution => Some(AlertLevel::Caution),
            SeverityTier::Excellent | SeverityTier::Good => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Caution => "caution",
            AlertLevel::Critical => "critical",
        }
    }
}

/// An alert produced by the engine on a qualifying transition.
///
/// Serialized field names match the alert documents the dashboard already
/// stores (`alertId`, `type`, epoch-millisecond `timestamp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    #[serde(rename = "alertId")]
    pub id: String,
    #[serde(rename = "sensor")]
    pub kind: SensorKind,
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub value: f64,
    pub title: String,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged: bool,
}

/// Builds the stable primary key `{kind}_{level}_{epochMillis}`.
pub fn alert_id(kind: SensorKind, level: AlertLevel, timestamp: DateTime<Utc>) -> String {
    format!("{}_{}_{}", kind.key(), level.as_str(), timestamp.timestamp_millis())
}

/// Recovers the sensor kind from an alert id.
///
/// Kind keys themselves contain underscores, so the id is split from the
/// right: the last two segments are the level and the timestamp.
pub fn kind_from_alert_id(id: &str) -> Option<SensorKind> {
    let mut parts = id.rsplitn(3, '_');
    let millis = parts.next()?;
    let level = parts.next()?;
    let kind = parts.next()?;
    if millis.parse::<i64>().is_err() || !matches!(level, "caution" | "critical") {
        return None;
    }
    ALL_SENSOR_KINDS
        .into_iter()
        .find(|k| k.key() == kind)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures reading or writing per-sensor transition state.
#[derive(Debug, PartialEq)]
pub enum StoreError {
    /// The backing store could not be reached.
    Unavailable(String),
    /// A query or write was rejected by the backing store.
    Query(String),
    /// A stored value could not be interpreted.
    Corrupt { kind: SensorKind, detail: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Query(msg) => write!(f, "Store query failed: {}", msg),
            StoreError::Corrupt { kind, detail } => {
                write!(f, "Corrupt state for sensor {}: {}", kind, detail)
            }
        }
    }
}

impl std::error::Error for StoreError {}
