/// Persisted per-sensor transition state.
///
/// The engine only needs two values per sensor kind: the last classified
/// tier and the time of the last alert. Anything that can read and write
/// those, plus reset the alert time, is a `TransitionStore`.
///
/// Submodules:
/// - `postgres`: `PostgresTransitionStore`, one row per sensor kind.

pub mod postgres;

use crate::model::{epoch_zero, SensorKind, SensorState, SeverityTier, StoreError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub use self::postgres::PostgresTransitionStore;

/// Key-value access to per-sensor state.
///
/// Methods take `&mut self`: the engine holds exclusive access for the
/// whole evaluation call, so each kind's read-modify-write is atomic.
/// Collaborators that evaluate from several threads wrap the store in a
/// `Mutex`.
pub trait TransitionStore {
    /// Last classified tier; `Good` when nothing has been stored yet.
    fn last_tier(&mut self, kind: SensorKind) -> Result<SeverityTier, StoreError>;

    fn set_last_tier(&mut self, kind: SensorKind, tier: SeverityTier) -> Result<(), StoreError>;

    /// Time of the last alert; epoch-zero when none has fired.
    fn last_alert_at(&mut self, kind: SensorKind) -> Result<DateTime<Utc>, StoreError>;

    fn set_last_alert_at(&mut self, kind: SensorKind, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Clears the cooldown for `kind` by setting its last alert time back to
    /// epoch-zero. The last tier is left untouched.
    fn reset(&mut self, kind: SensorKind) -> Result<(), StoreError> {
        self.set_last_alert_at(kind, epoch_zero())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A `HashMap`-backed store. State lives as long as the value does.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTransitionStore {
    states: HashMap<SensorKind, SensorState>,
}

impl InMemoryTransitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for `kind`, or the implicit initial state.
    pub fn state(&self, kind: SensorKind) -> SensorState {
        self.states.get(&kind).copied().unwrap_or_default()
    }

    /// Copy of every state recorded so far, keyed by sensor.
    pub fn snapshot(&self) -> HashMap<SensorKind, SensorState> {
        self.states.clone()
    }
}

impl TransitionStore for InMemoryTransitionStore {
    fn last_tier(&mut self, kind: SensorKind) -> Result<SeverityTier, StoreError> {
        Ok(self.state(kind).last_tier)
    }

    fn set_last_tier(&mut self, kind: SensorKind, tier: SeverityTier) -> Result<(), StoreError> {
        self.states.entry(kind).or_default().last_tier = tier;
        Ok(())
    }

    fn last_alert_at(&mut self, kind: SensorKind) -> Result<DateTime<Utc>, StoreError> {
        Ok(self.state(kind).last_alert_at)
    }

    fn set_last_alert_at(&mut self, kind: SensorKind, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.states.entry(kind).or_default().last_alert_at = at;
        Ok(())
    }
}
