/// Threshold registry for the monitored tank and grow bed sensors.
///
/// Defines the band boundaries that separate Excellent, Good, Caution and
/// Critical readings for every `SensorKind`. This is the single source of
/// truth for threshold values: the classifier and the guidance generator
/// both receive a `ThresholdTable` rather than hardcoding numbers.
///
/// Default values come from the aquaponics rig's field calibration. A
/// deployment can override any subset of them from the `[thresholds]` table
/// of its config file (see `config::load_config`).

use crate::model::{SensorKind, ALL_SENSOR_KINDS};
use serde::Deserialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Band shapes
// ---------------------------------------------------------------------------

/// An inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// How a sensor's bands are laid out on the number line.
///
/// Boundaries are inclusive toward the better tier: a pH of exactly 7.5
/// is still Excellent, a turbidity of exactly 80 NTU is still Good.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Bands {
    /// Ideal band in the middle, trouble on either side.
    TwoSided {
        excellent: Range,
        acceptable: Range,
        caution: Range,
    },
    /// Higher is better; only the low side is unsafe.
    Floor {
        excellent_min: f64,
        acceptable_min: f64,
        caution_min: f64,
    },
    /// Lower is better; only the high side is unsafe.
    Ceiling {
        excellent_max: f64,
        acceptable_max: f64,
        caution_max: f64,
    },
    /// Two-state switch. `triggered` is the Critical value, anything else
    /// is Good.
    Switch { triggered: f64 },
}

impl Bands {
    /// Every boundary value, ascending.
    pub fn boundaries(&self) -> Vec<f64> {
        match *self {
            Bands::TwoSided { excellent, acceptable, caution } => vec![
                caution.min,
                acceptable.min,
                excellent.min,
                excellent.max,
                acceptable.max,
                caution.max,
            ],
            Bands::Floor { excellent_min, acceptable_min, caution_min } => {
                vec![caution_min, acceptable_min, excellent_min]
            }
            Bands::Ceiling { excellent_max, acceptable_max, caution_max } => {
                vec![excellent_max, acceptable_max, caution_max]
            }
            Bands::Switch { triggered } => vec![triggered],
        }
    }

    fn shape_name(&self) -> &'static str {
        match self {
            Bands::TwoSided { .. } => "two_sided",
            Bands::Floor { .. } => "floor",
            Bands::Ceiling { .. } => "ceiling",
            Bands::Switch { .. } => "switch",
        }
    }
}

// ---------------------------------------------------------------------------
// Threshold table
// ---------------------------------------------------------------------------

/// Band definitions for every sensor kind.
///
/// Missing entries in a config file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThresholdTable {
    pub ph: Bands,
    pub water_temp: Bands,
    pub air_temp: Bands,
    pub humidity: Bands,
    pub dissolved_oxygen: Bands,
    pub turbidity: Bands,
    pub float_switch: Bands,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            ph: Bands::TwoSided {
                excellent: Range::new(6.5, 7.5),
                acceptable: Range::new(6.0, 7.8),
                caution: Range::new(5.5, 8.5),
            },
            // °C, tilapia comfort range
            water_temp: Bands::TwoSided {
                excellent: Range::new(26.0, 30.0),
                acceptable: Range::new(22.0, 32.0),
                caution: Range::new(20.0, 34.0),
            },
            // °C, grow bed ambient
            air_temp: Bands::TwoSided {
                excellent: Range::new(20.0, 27.0),
                acceptable: Range::new(18.0, 29.0),
                caution: Range::new(15.0, 35.0),
            },
            // % relative humidity
            humidity: Bands::TwoSided {
                excellent: Range::new(50.0, 70.0),
                acceptable: Range::new(40.0, 75.0),
                caution: Range::new(30.0, 90.0),
            },
            // mg/L
            dissolved_oxygen: Bands::Floor {
                excellent_min: 7.0,
                acceptable_min: 5.0,
                caution_min: 3.0,
            },
            // NTU
            turbidity: Bands::Ceiling {
                excellent_max: 20.0,
                acceptable_max: 80.0,
                caution_max: 150.0,
            },
            float_switch: Bands::Switch { triggered: 1.0 },
        }
    }
}

impl ThresholdTable {
    /// Returns the bands configured for `kind`.
    pub fn bands(&self, kind: SensorKind) -> &Bands {
        match kind {
            SensorKind::Ph => &self.ph,
            SensorKind::WaterTemperature => &self.water_temp,
            SensorKind::AirTemperature => &self.air_temp,
            SensorKind::Humidity => &self.humidity,
            SensorKind::DissolvedOxygen => &self.dissolved_oxygen,
            SensorKind::Turbidity => &self.turbidity,
            SensorKind::FloatSwitch => &self.float_switch,
        }
    }

    /// Parses a table from TOML text, filling unspecified kinds with defaults,
    /// and validates the result.
    pub fn from_toml_str(text: &str) -> Result<ThresholdTable, ThresholdError> {
        let table: ThresholdTable =
            toml::from_str(text).map_err(|e| ThresholdError::Parse(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// Checks that each kind uses the band shape its classifier and guidance
    /// expect, that every boundary is finite, and that boundaries nest in
    /// order. A table that passes leaves no gaps or overlaps between tiers.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for kind in ALL_SENSOR_KINDS {
            let bands = self.bands(kind);
            let expected = expected_shape(kind);
            if bands.shape_name() != expected {
                return Err(ThresholdError::WrongShape {
                    kind,
                    expected,
                    found: bands.shape_name(),
                });
            }

            let edges = bands.boundaries();
            if edges.iter().any(|v| !v.is_finite()) {
                return Err(ThresholdError::NonFinite(kind));
            }
            if edges.windows(2).any(|w| w[0] > w[1]) {
                return Err(ThresholdError::Unordered(kind));
            }
        }
        Ok(())
    }
}

fn expected_shape(kind: SensorKind) -> &'static str {
    match kind {
        SensorKind::Ph
        | SensorKind::WaterTemperature
        | SensorKind::AirTemperature
        | SensorKind::Humidity => "two_sided",
        SensorKind::DissolvedOxygen => "floor",
        SensorKind::Turbidity => "ceiling",
        SensorKind::FloatSwitch => "switch",
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum ThresholdError {
    /// The TOML text could not be deserialized.
    Parse(String),
    /// A kind was configured with a band shape it cannot use.
    WrongShape {
        kind: SensorKind,
        expected: &'static str,
        found: &'static str,
    },
    /// A boundary is NaN or infinite.
    NonFinite(SensorKind),
    /// Boundaries do not nest (e.g. acceptable wider than caution).
    Unordered(SensorKind),
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdError::Parse(msg) => write!(f, "Threshold parse error: {}", msg),
            ThresholdError::WrongShape { kind, expected, found } => write!(
                f,
                "Thresholds for {} must use shape '{}', found '{}'",
                kind, expected, found
            ),
            ThresholdError::NonFinite(kind) => {
                write!(f, "Thresholds for {} contain a non-finite boundary", kind)
            }
            ThresholdError::Unordered(kind) => {
                write!(f, "Thresholds for {} are not in ascending order", kind)
            }
        }
    }
}

impl std::error::Error for ThresholdError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
