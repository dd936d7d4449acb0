//! Edge-triggered alert evaluation with a per-sensor cooldown.
//!
//! For each reading the engine classifies the value, compares the tier with
//! the last stored tier for that sensor, and fires only on an escalation:
//!
//! ```text
//!   Excellent | Good  ──►  Caution | Critical     fires
//!   Caution           ──►  Critical               fires
//!   anything else (same tier, de-escalation)      never fires
//! ```
//!
//! The stored tier is updated for every reading *before* the cooldown gate.
//! A sensor that goes Critical during a cooldown is therefore remembered as
//! Critical, and does not re-fire as a fresh Good→Critical escalation once
//! the cooldown expires.
//!
//! Store failures are scoped to the reading that hit them: the engine
//! records the failure and carries on with the rest of the batch.

use crate::alert::classify::{classify, is_above_ideal};
use crate::alert::cooldown::{default_cooldown, is_within_cooldown_at};
use crate::alert::guidance::{guidance, title};
use crate::logging::{self, Component};
use crate::model::{
    alert_id, kind_from_alert_id, Actuator, AlertLevel, AlertRecord, Reading, SensorKind,
    SeverityTier, StoreError,
};
use crate::sensors::ThresholdTable;
use crate::store::TransitionStore;
use chrono::Duration;
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Automation
// ---------------------------------------------------------------------------

/// Which corrective actuators are running in automatic mode.
///
/// Actuator modes come from the device's commands document. Sensor
/// overrides (a per-kind map from config or the caller) win over them.
/// Anything not mentioned is automatic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutomationModes {
    actuators: HashMap<Actuator, bool>,
    sensors: HashMap<SensorKind, bool>,
}

impl AutomationModes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_actuator(&mut self, actuator: Actuator, automatic: bool) {
        self.actuators.insert(actuator, automatic);
    }

    pub fn set_sensor(&mut self, kind: SensorKind, automatic: bool) {
        self.sensors.insert(kind, automatic);
    }

    pub fn actuator_mode(&self, actuator: Actuator) -> Option<bool> {
        self.actuators.get(&actuator).copied()
    }

    pub fn sensor_override(&self, kind: SensorKind) -> Option<bool> {
        self.sensors.get(&kind).copied()
    }

    /// `true` if `actuator`, the one correcting `kind` right now, will act
    /// on its own.
    pub fn is_automatic(&self, kind: SensorKind, actuator: Option<Actuator>) -> bool {
        if let Some(automatic) = self.sensor_override(kind) {
            return automatic;
        }
        actuator
            .and_then(|a| self.actuator_mode(a))
            .unwrap_or(true)
    }

    /// Copies every entry of `other` over this one.
    pub fn merge(&mut self, other: &AutomationModes) {
        self.actuators.extend(other.actuators.iter().map(|(a, m)| (*a, *m)));
        self.sensors.extend(other.sensors.iter().map(|(k, m)| (*k, *m)));
    }
}

impl From<HashMap<SensorKind, bool>> for AutomationModes {
    fn from(sensors: HashMap<SensorKind, bool>) -> Self {
        Self { actuators: HashMap::new(), sensors }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A reading whose evaluation hit a store error.
#[derive(Debug, PartialEq)]
pub struct KindFailure {
    pub kind: SensorKind,
    pub error: StoreError,
}

/// Outcome of one evaluation call.
#[derive(Debug, Default, PartialEq)]
pub struct Evaluation {
    /// New alerts, in reading order.
    pub alerts: Vec<AlertRecord>,
    /// Readings that could not be evaluated, or whose cooldown could not be
    /// recorded.
    pub failures: Vec<KindFailure>,
    /// Number of readings whose tier was classified and stored.
    pub evaluated: usize,
}

impl Evaluation {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, PartialEq)]
pub enum AcknowledgeError {
    /// The id does not have the `{kind}_{level}_{millis}` shape.
    UnknownAlertId(String),
    Store(StoreError),
}

impl fmt::Display for AcknowledgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcknowledgeError::UnknownAlertId(id) => write!(f, "Unrecognized alert id: {}", id),
            AcknowledgeError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AcknowledgeError {}

impl From<StoreError> for AcknowledgeError {
    fn from(e: StoreError) -> Self {
        AcknowledgeError::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// `true` if moving from `previous` to `current` is an alert-worthy
/// escalation.
pub fn is_eligible_transition(previous: SeverityTier, current: SeverityTier) -> bool {
    let was_normal = matches!(previous, SeverityTier::Excellent | SeverityTier::Good);
    (was_normal && current.is_alerting())
        || (previous == SeverityTier::Caution && current == SeverityTier::Critical)
}

#[derive(Debug, Clone)]
pub struct AlertEngine {
    thresholds: ThresholdTable,
    cooldown: Duration,
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(ThresholdTable::default(), default_cooldown())
    }
}

impl AlertEngine {
    pub fn new(thresholds: ThresholdTable, cooldown: Duration) -> Self {
        Self { thresholds, cooldown }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Evaluates a batch of readings against `store`, in order.
    ///
    /// Each reading's timestamp is its own "now" for the cooldown check.
    pub fn evaluate<S: TransitionStore>(
        &self,
        store: &mut S,
        readings: &[Reading],
        automation: &AutomationModes,
    ) -> Evaluation {
        let mut outcome = Evaluation::default();

        for reading in readings {
            let kind = reading.kind;
            match self.decide(store, reading, automation) {
                Ok(decision) => {
                    outcome.evaluated += 1;
                    let Some(record) = decision else { continue };

                    if let Err(e) = store.set_last_alert_at(kind, reading.timestamp) {
                        // Still emitted; only the cooldown is lost.
                        logging::warn(
                            Component::Store,
                            Some(kind.key()),
                            &format!("Recording alert time failed: {}", e),
                        );
                        outcome.failures.push(KindFailure { kind, error: e });
                    }

                    logging::info(
                        Component::Engine,
                        Some(kind.key()),
                        &format!("{} alert {}: {}", record.level.as_str(), record.id, record.title),
                    );
                    outcome.alerts.push(record);
                }
                Err(e) => {
                    logging::warn(
                        Component::Store,
                        Some(kind.key()),
                        &format!("Evaluation skipped: {}", e),
                    );
                    outcome.failures.push(KindFailure { kind, error: e });
                }
            }
        }

        logging::log_evaluation_summary(
            outcome.evaluated,
            outcome.alerts.len(),
            readings.len() - outcome.evaluated,
        );
        outcome
    }

    /// Classifies one reading, updates the stored tier, and returns the
    /// alert that should fire, if any. Does not record the alert time.
    fn decide<S: TransitionStore>(
        &self,
        store: &mut S,
        reading: &Reading,
        automation: &AutomationModes,
    ) -> Result<Option<AlertRecord>, StoreError> {
        let kind = reading.kind;
        let tier = classify(&self.thresholds, kind, reading.value);
        let previous = store.last_tier(kind)?;

        // Unconditional, and before the cooldown gate.
        store.set_last_tier(kind, tier)?;

        if !is_eligible_transition(previous, tier) {
            return Ok(None);
        }

        let last_alert_at = store.last_alert_at(kind)?;
        if is_within_cooldown_at(last_alert_at, self.cooldown, reading.timestamp) {
            logging::debug(
                Component::Engine,
                Some(kind.key()),
                &format!("{} -> {} suppressed by cooldown", previous, tier),
            );
            return Ok(None);
        }

        let Some(level) = AlertLevel::from_tier(tier) else {
            return Ok(None);
        };
        let actuator = kind.actuator(is_above_ideal(&self.thresholds, kind, reading.value));
        let message = guidance(
            &self.thresholds,
            kind,
            tier,
            reading.value,
            automation.is_automatic(kind, actuator),
        );

        Ok(Some(AlertRecord {
            id: alert_id(kind, level, reading.timestamp),
            kind,
            level,
            value: reading.value,
            title: title(&self.thresholds, kind, reading.value),
            message,
            timestamp: reading.timestamp,
            acknowledged: false,
        }))
    }

    /// Handles a user acknowledging `alert_id`: clears that sensor's
    /// cooldown so the next escalation fires immediately.
    pub fn acknowledge<S: TransitionStore>(
        &self,
        store: &mut S,
        alert_id: &str,
    ) -> Result<SensorKind, AcknowledgeError> {
        let kind = kind_from_alert_id(alert_id)
            .ok_or_else(|| AcknowledgeError::UnknownAlertId(alert_id.to_string()))?;
        store.reset(kind)?;
        logging::info(
            Component::Engine,
            Some(kind.key()),
            &format!("Cooldown reset after acknowledging {}", alert_id),
        );
        Ok(kind)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{epoch_zero, ALL_SENSOR_KINDS};
    use crate::store::InMemoryTransitionStore;
    use chrono::{DateTime, TimeZone, Utc};

    const ALL_TIERS: [SeverityTier; 4] = [
        SeverityTier::Excellent,
        SeverityTier::Good,
        SeverityTier::Caution,
        SeverityTier::Critical,
    ];

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn ph(value: f64, secs: i64) -> Reading {
        Reading::new(SensorKind::Ph, value, at(secs))
    }

    #[derive(PartialEq)]
    enum FailOn {
        TierRead,
        TierWrite,
        AlertWrite,
    }

    /// Store with one failing operation for one kind.
    struct FailingStore {
        inner: InMemoryTransitionStore,
        broken: SensorKind,
        fail_on: FailOn,
    }

    impl FailingStore {
        fn new(broken: SensorKind, fail_on: FailOn) -> Self {
            Self { inner: InMemoryTransitionStore::new(), broken, fail_on }
        }

        fn fails(&self, kind: SensorKind, op: FailOn) -> bool {
            kind == self.broken && self.fail_on == op
        }
    }

    impl TransitionStore for FailingStore {
        fn last_tier(&mut self, kind: SensorKind) -> Result<SeverityTier, StoreError> {
            if self.fails(kind, FailOn::TierRead) {
                return Err(StoreError::Unavailable("disk offline".to_string()));
            }
            self.inner.last_tier(kind)
        }
        fn set_last_tier(&mut self, kind: SensorKind, tier: SeverityTier) -> Result<(), StoreError> {
            if self.fails(kind, FailOn::TierWrite) {
                return Err(StoreError::Query("constraint violation".to_string()));
            }
            self.inner.set_last_tier(kind, tier)
        }
        fn last_alert_at(&mut self, kind: SensorKind) -> Result<DateTime<Utc>, StoreError> {
            self.inner.last_alert_at(kind)
        }
        fn set_last_alert_at(&mut self, kind: SensorKind, at: DateTime<Utc>) -> Result<(), StoreError> {
            if self.fails(kind, FailOn::AlertWrite) {
                return Err(StoreError::Query("read-only".to_string()));
            }
            self.inner.set_last_alert_at(kind, at)
        }
    }

    #[test]
    fn test_transition_predicate_table() {
        for previous in ALL_TIERS {
            for current in ALL_TIERS {
                let expected = matches!(
                    (previous, current),
                    (SeverityTier::Excellent | SeverityTier::Good, SeverityTier::Caution | SeverityTier::Critical)
                        | (SeverityTier::Caution, SeverityTier::Critical)
                );
                assert_eq!(
                    is_eligible_transition(previous, current),
                    expected,
                    "{:?} -> {:?}",
                    previous,
                    current
                );
            }
        }
    }

    #[test]
    fn test_first_caution_reading_fires() {
        let engine = AlertEngine::default();
        let mut store = InMemoryTransitionStore::new();
        let out = engine.evaluate(&mut store, &[ph(7.9, 0)], &AutomationModes::new());

        assert_eq!(out.alerts.len(), 1);
        let alert = &out.alerts[0];
        assert_eq!(alert.level, AlertLevel::Caution);
        assert_eq!(alert.id, format!("ph_caution_{}", t0().timestamp_millis()));
        assert_eq!(alert.title, "pH: 7.90");
        assert!(!alert.acknowledged);
        assert_eq!(store.state(SensorKind::Ph).last_alert_at, t0());
    }

    #[test]
    fn test_healthy_reading_updates_tier_without_alert() {
        let engine = AlertEngine::default();
        let mut store = InMemoryTransitionStore::new();
        let out = engine.evaluate(&mut store, &[ph(7.0, 0)], &AutomationModes::new());

        assert!(out.alerts.is_empty());
        assert_eq!(out.evaluated, 1);
        assert_eq!(store.state(SensorKind::Ph).last_tier, SeverityTier::Excellent);
        assert_eq!(store.state(SensorKind::Ph).last_alert_at, epoch_zero());
    }

    #[test]
    fn test_repeated_readings_fire_once() {
        let engine = AlertEngine::default();
        let mut store = InMemoryTransitionStore::new();
        let modes = AutomationModes::new();
        let mut total = 0;
        for i in 0..50 {
            total += engine.evaluate(&mut store, &[ph(8.0, i * 5)], &modes).alerts.len();
        }
        assert_eq!(total, 1, "a steady Caution reading should alert exactly once");
    }

    #[test]
    fn test_escalation_inside_cooldown_is_suppressed_and_remembered() {
        let engine = AlertEngine::default();
        let mut store = InMemoryTransitionStore::new();
        let modes = AutomationModes::new();

        assert_eq!(engine.evaluate(&mut store, &[ph(7.9, 0)], &modes).alerts.len(), 1);
        let out = engine.evaluate(&mut store, &[ph(8.6, 60)], &modes);
        assert!(out.alerts.is_empty(), "Caution -> Critical within cooldown must not fire");
        assert_eq!(store.state(SensorKind::Ph).last_tier, SeverityTier::Critical);

        // Still Critical after the window: not a transition.
        let out = engine.evaluate(&mut store, &[ph(8.7, 400)], &modes);
        assert!(out.alerts.is_empty(), "Critical -> Critical must never fire");
    }

    #[test]
    fn test_de_escalation_never_fires() {
        let engine = AlertEngine::default();
        let mut store = InMemoryTransitionStore::new();
        let modes = AutomationModes::new();
        store.set_last_tier(SensorKind::Ph, SeverityTier::Critical).unwrap();

        for (value, secs) in [(8.0, 1_000), (7.7, 2_000), (7.0, 3_000)] {
            let out = engine.evaluate(&mut store, &[ph(value, secs)], &modes);
            assert!(out.alerts.is_empty(), "de-escalation to {} fired", value);
        }
    }

    #[test]
    fn test_acknowledge_lets_next_escalation_fire_immediately() {
        let engine = AlertEngine::default();
        let mut store = InMemoryTransitionStore::new();
        let modes = AutomationModes::new();

        let first = engine.evaluate(&mut store, &[ph(7.9, 0)], &modes).alerts;
        assert_eq!(first.len(), 1);

        let kind = engine.acknowledge(&mut store, &first[0].id).unwrap();
        assert_eq!(kind, SensorKind::Ph);
        assert_eq!(store.state(SensorKind::Ph).last_tier, SeverityTier::Caution);

        let out = engine.evaluate(&mut store, &[ph(8.6, 30)], &modes);
        assert_eq!(out.alerts.len(), 1, "escalation after acknowledge should fire");
        assert_eq!(out.alerts[0].level, AlertLevel::Critical);
    }

    #[test]
    fn test_acknowledge_rejects_unknown_id() {
        let engine = AlertEngine::default();
        let mut store = InMemoryTransitionStore::new();
        assert_eq!(
            engine.acknowledge(&mut store, "nonsense"),
            Err(AcknowledgeError::UnknownAlertId("nonsense".to_string()))
        );
    }

    #[test]
    fn test_automation_mode_flows_into_message() {
        let engine = AlertEngine::default();
        let mut store = InMemoryTransitionStore::new();
        let mut modes = AutomationModes::new();
        modes.set_sensor(SensorKind::WaterTemperature, false);

        let reading = Reading::new(SensorKind::WaterTemperature, 35.0, t0());
        let out = engine.evaluate(&mut store, &[reading], &modes);
        assert!(
            out.alerts[0].message.starts_with(crate::alert::guidance::AUTOMATION_DISABLED_MARKER),
            "got '{}'",
            out.alerts[0].message
        );
    }

    #[test]
    fn test_missing_automation_entry_defaults_to_enabled() {
        let modes = AutomationModes::new();
        for kind in ALL_SENSOR_KINDS {
            for above in [true, false] {
                assert!(modes.is_automatic(kind, kind.actuator(above)));
            }
        }
    }

    #[test]
    fn test_hot_water_follows_fan_mode_not_heater() {
        let engine = AlertEngine::default();
        let mut modes = AutomationModes::new();
        modes.set_actuator(Actuator::Fan, false);
        modes.set_actuator(Actuator::Heater, true);

        let mut store = InMemoryTransitionStore::new();
        let hot = Reading::new(SensorKind::WaterTemperature, 35.0, t0());
        let out = engine.evaluate(&mut store, &[hot], &modes);
        let message = &out.alerts[0].message;
        assert!(
            message.starts_with(crate::alert::guidance::AUTOMATION_DISABLED_MARKER),
            "manual fan cannot cool the water: '{}'",
            message
        );
        assert!(message.contains("ventilation fan"), "got '{}'", message);

        let mut store = InMemoryTransitionStore::new();
        let cold = Reading::new(SensorKind::WaterTemperature, 18.0, t0());
        let out = engine.evaluate(&mut store, &[cold], &modes);
        assert!(
            !out.alerts[0].message.contains(crate::alert::guidance::AUTOMATION_DISABLED_MARKER),
            "automatic heater handles cold water: '{}'",
            out.alerts[0].message
        );
    }

    #[test]
    fn test_sensor_override_beats_actuator_mode() {
        let mut modes = AutomationModes::new();
        modes.set_actuator(Actuator::Fan, true);
        modes.set_sensor(SensorKind::Humidity, false);
        assert!(!modes.is_automatic(SensorKind::Humidity, Some(Actuator::Fan)));
        assert!(modes.is_automatic(SensorKind::AirTemperature, Some(Actuator::Fan)));

        let mut merged = AutomationModes::new();
        merged.set_actuator(Actuator::Valve, false);
        merged.merge(&modes);
        assert_eq!(merged.actuator_mode(Actuator::Valve), Some(false));
        assert_eq!(merged.sensor_override(SensorKind::Humidity), Some(false));
    }

    #[test]
    fn test_store_failure_is_scoped_to_one_kind() {
        let engine = AlertEngine::default();
        let mut store = FailingStore::new(SensorKind::Ph, FailOn::TierRead);
        let readings = [
            ph(8.6, 0),
            Reading::new(SensorKind::Turbidity, 200.0, t0()),
        ];
        let out = engine.evaluate(&mut store, &readings, &AutomationModes::new());

        assert_eq!(out.evaluated, 1);
        assert_eq!(out.alerts.len(), 1);
        assert_eq!(out.alerts[0].kind, SensorKind::Turbidity);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].kind, SensorKind::Ph);
        assert!(!out.is_clean());
    }

    #[test]
    fn test_failed_tier_write_is_scoped_to_one_kind() {
        let engine = AlertEngine::default();
        let mut store = FailingStore::new(SensorKind::Turbidity, FailOn::TierWrite);
        let readings = [
            Reading::new(SensorKind::Turbidity, 200.0, t0()),
            ph(8.6, 0),
        ];
        let out = engine.evaluate(&mut store, &readings, &AutomationModes::new());

        assert_eq!(out.evaluated, 1, "only pH should be evaluated");
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].kind, SensorKind::Turbidity);
        assert_eq!(out.alerts.len(), 1, "pH later in the batch still alerts");
        assert_eq!(out.alerts[0].kind, SensorKind::Ph);
        assert_eq!(
            store.inner.state(SensorKind::Turbidity).last_alert_at,
            epoch_zero(),
            "no alert time recorded for the failed reading"
        );
    }

    #[test]
    fn test_failed_alert_time_write_still_emits_alert() {
        let engine = AlertEngine::default();
        let mut store = FailingStore::new(SensorKind::Humidity, FailOn::AlertWrite);
        let out = engine.evaluate(
            &mut store,
            &[Reading::new(SensorKind::Humidity, 95.0, t0())],
            &AutomationModes::new(),
        );
        assert_eq!(out.alerts.len(), 1);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.evaluated, 1);
    }

    #[test]
    fn test_custom_cooldown_is_honoured() {
        let engine = AlertEngine::new(ThresholdTable::default(), Duration::seconds(30));
        let mut store = InMemoryTransitionStore::new();
        let modes = AutomationModes::new();

        assert_eq!(engine.evaluate(&mut store, &[ph(7.9, 0)], &modes).alerts.len(), 1);
        engine.evaluate(&mut store, &[ph(7.0, 10)], &modes);
        assert_eq!(engine.evaluate(&mut store, &[ph(7.9, 31)], &modes).alerts.len(), 1);
    }
}
