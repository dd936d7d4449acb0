//! Severity classification of a single reading.
//!
//! `classify` is a pure, total function: every `f64` maps to exactly one
//! tier. Non-finite values (NaN, ±∞) are Critical for every sensor kind.

use crate::model::{SensorKind, SeverityTier};
use crate::sensors::{Bands, ThresholdTable};

/// Classifies `value` for `kind` against `table`.
pub fn classify(table: &ThresholdTable, kind: SensorKind, value: f64) -> SeverityTier {
    if !value.is_finite() {
        return SeverityTier::Critical;
    }
    classify_bands(table.bands(kind), value)
}

fn classify_bands(bands: &Bands, value: f64) -> SeverityTier {
    match *bands {
        Bands::TwoSided { excellent, acceptable, caution } => {
            if excellent.contains(value) {
                SeverityTier::Excellent
            } else if acceptable.contains(value) {
                SeverityTier::Good
            } else if caution.contains(value) {
                SeverityTier::Caution
            } else {
                SeverityTier::Critical
            }
        }
        Bands::Floor { excellent_min, acceptable_min, caution_min } => {
            if value >= excellent_min {
                SeverityTier::Excellent
            } else if value >= acceptable_min {
                SeverityTier::Good
            } else if value >= caution_min {
                SeverityTier::Caution
            } else {
                SeverityTier::Critical
            }
        }
        Bands::Ceiling { excellent_max, acceptable_max, caution_max } => {
            if value <= excellent_max {
                SeverityTier::Excellent
            } else if value <= acceptable_max {
                SeverityTier::Good
            } else if value <= caution_max {
                SeverityTier::Caution
            } else {
                SeverityTier::Critical
            }
        }
        // Boolean equality: the device reports exactly 0 or 1.
        Bands::Switch { triggered } => {
            if value == triggered {
                SeverityTier::Critical
            } else {
                SeverityTier::Good
            }
        }
    }
}

/// `true` when `value` sits above the sensor's ideal band.
///
/// Guidance uses this to pick "too high" versus "too low" wording. For
/// one-sided kinds the unsafe direction is fixed: low for dissolved oxygen,
/// high for turbidity. A triggered float switch counts as low water.
pub fn is_above_ideal(table: &ThresholdTable, kind: SensorKind, value: f64) -> bool {
    match *table.bands(kind) {
        Bands::TwoSided { excellent, .. } => value > excellent.max,
        Bands::Floor { .. } => false,
        Bands::Ceiling { .. } => true,
        Bands::Switch { .. } => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
