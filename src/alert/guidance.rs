//! Human-readable guidance attached to alerts.
//!
//! Every function here is pure and total. Wording depends on the sensor,
//! the tier, which side of the ideal band the value sits on, and whether
//! the sensor's actuator is in automatic mode.

use crate::alert::classify::is_above_ideal;
use crate::model::{SensorKind, SeverityTier};
use crate::sensors::{Bands, ThresholdTable};

/// Every disabled-automation warning starts with this text.
pub const AUTOMATION_DISABLED_MARKER: &str = "Automation disabled";

/// Builds the guidance sentence for one reading.
///
/// `automation_enabled` is the mode of the actuator that corrects this
/// reading, i.e. `kind.actuator(is_above_ideal(..))`. When it is false, the
/// tier is Caution or Critical, and such an actuator exists, the base
/// guidance is prefixed with an explicit warning that nothing will
/// self-correct. Sensors without an actuator never get the prefix.
pub fn guidance(
    table: &ThresholdTable,
    kind: SensorKind,
    tier: SeverityTier,
    value: f64,
    automation_enabled: bool,
) -> String {
    let base = base_guidance(table, kind, tier, value);
    match kind.actuator(is_above_ideal(table, kind, value)) {
        Some(actuator) if !automation_enabled && tier.is_alerting() => format!(
            "{}: the {} is in manual mode and will NOT correct this automatically. {}",
            AUTOMATION_DISABLED_MARKER,
            actuator.description(),
            base
        ),
        _ => base.to_string(),
    }
}

fn base_guidance(table: &ThresholdTable, kind: SensorKind, tier: SeverityTier, value: f64) -> &'static str {
    let high = is_above_ideal(table, kind, value);
    match kind {
        SensorKind::Ph => match (tier, high) {
            (SeverityTier::Caution, true) => {
                "pH slightly high. Consider a partial water change or check the source water."
            }
            (SeverityTier::Caution, false) => {
                "pH slightly low. Review buffering capacity or replace part of the tank water."
            }
            (SeverityTier::Critical, true) => {
                "pH high. Perform a partial water change and inspect for ammonia buildup."
            }
            (SeverityTier::Critical, false) => {
                "pH low. Add buffer or replace water immediately to prevent fish stress."
            }
            _ => "pH stable within the optimal range.",
        },

        SensorKind::WaterTemperature => match (tier, high) {
            (SeverityTier::Caution, true) => {
                "Water getting warm. The cooling fan may activate; increase aeration if it persists."
            }
            (SeverityTier::Caution, false) => {
                "Water cooling. The heater may activate to stabilize the fish environment."
            }
            (SeverityTier::Critical, true) => {
                "Water too hot. Make sure the fans are running and hold feeding until it cools."
            }
            (SeverityTier::Critical, false) => {
                "Water too cold. Turn the heater on to prevent fish stress."
            }
            _ => "Water temperature optimal.",
        },

        SensorKind::AirTemperature => match (tier, high) {
            (SeverityTier::Caution, true) => {
                "Air warming. Fans may activate to keep the grow area stable."
            }
            (SeverityTier::Caution, false) => {
                "Air cooling. Watch the grow area if it keeps dropping below the comfort range."
            }
            (SeverityTier::Critical, true) => {
                "Air temperature very high. Run the ventilation fans and shade the tank to reduce heat."
            }
            (SeverityTier::Critical, false) => {
                "Air temperature too low. Check for cold drafts or add insulation."
            }
            _ => "Air temperature stable.",
        },

        SensorKind::Humidity => match (tier, high) {
            (SeverityTier::Caution, true) => {
                "Humidity rising. Fans may activate to prevent algae and mold."
            }
            (SeverityTier::Caution, false) => {
                "Humidity low. Misting or covering may help plants avoid stress."
            }
            (SeverityTier::Critical, true) => {
                "Humidity very high. Run the fans longer or increase air exchange."
            }
            (SeverityTier::Critical, false) => {
                "Humidity too low. Plant transpiration may drop; cover or mist slightly."
            }
            _ => "Humidity stable and healthy.",
        },

        SensorKind::DissolvedOxygen => match tier {
            SeverityTier::Caution => "Dissolved oxygen slightly low. Increase surface agitation.",
            SeverityTier::Critical => "Dissolved oxygen critically low. Boost aeration immediately.",
            SeverityTier::Excellent | SeverityTier::Good => "Oxygen level adequate.",
        },

        SensorKind::Turbidity => match tier {
            SeverityTier::Caution => "Water slightly cloudy. Check the filter and feeding routine.",
            SeverityTier::Critical => {
                "High turbidity. Perform a partial water change and inspect the filters."
            }
            SeverityTier::Excellent | SeverityTier::Good => "Water clarity normal.",
        },

        SensorKind::FloatSwitch => match tier {
            SeverityTier::Caution | SeverityTier::Critical => {
                "Water level low. The refill valve should open to top up the tank; check for leaks or a blocked intake."
            }
            SeverityTier::Excellent | SeverityTier::Good => "Water level normal.",
        },
    }
}

/// Short alert title such as `"pH: 7.90"` or `"Water Level: LOW"`.
pub fn title(table: &ThresholdTable, kind: SensorKind, value: f64) -> String {
    let formatted = match kind {
        SensorKind::Ph => format!("{:.2}", value),
        SensorKind::WaterTemperature | SensorKind::AirTemperature => format!("{:.1}°C", value),
        SensorKind::Humidity => format!("{:.0}%", value),
        SensorKind::DissolvedOxygen => format!("{:.1} mg/L", value),
        SensorKind::Turbidity => format!("{:.0} NTU", value),
        SensorKind::FloatSwitch => match *table.bands(kind) {
            Bands::Switch { triggered } if value == triggered => "LOW".to_string(),
            _ => "Normal".to_string(),
        },
    };
    format!("{}: {}", kind.label(), formatted)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
