/// PostgreSQL-backed transition store.
///
/// One row per sensor kind in `alert_sensor_state`. A missing row reads as
/// the implicit initial state (Good, never alerted); writes upsert.
///
/// The schema is created on connect if it does not exist, so a fresh
/// database needs no migration step.

use crate::model::{epoch_zero, SensorKind, SeverityTier, StoreError};
use crate::store::TransitionStore;
use ::postgres::{Client, NoTls};
use chrono::{DateTime, Utc};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS alert_sensor_state (
        sensor_kind   TEXT PRIMARY KEY,
        last_tier     TEXT NOT NULL DEFAULT 'good',
        last_alert_at TIMESTAMPTZ NOT NULL DEFAULT 'epoch'
    )
";

pub struct PostgresTransitionStore {
    client: Client,
}

impl PostgresTransitionStore {
    /// Connects to `database_url` and ensures the state table exists.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let client = Client::connect(database_url, NoTls)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::from_client(client)
    }

    /// Wraps an existing connection and ensures the state table exists.
    pub fn from_client(mut client: Client) -> Result<Self, StoreError> {
        client.batch_execute(CREATE_TABLE).map_err(query_error)?;
        Ok(Self { client })
    }

    /// Removes the row for `kind`, returning it to the initial state.
    pub fn clear(&mut self, kind: SensorKind) -> Result<(), StoreError> {
        self.client
            .execute(
                "DELETE FROM alert_sensor_state WHERE sensor_kind = $1",
                &[&kind.key()],
            )
            .map_err(query_error)?;
        Ok(())
    }
}

impl TransitionStore for PostgresTransitionStore {
    fn last_tier(&mut self, kind: SensorKind) -> Result<SeverityTier, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT last_tier FROM alert_sensor_state WHERE sensor_kind = $1",
                &[&kind.key()],
            )
            .map_err(query_error)?;

        let stored = match row {
            Some(r) => Some(
                r.try_get::<_, String>(0)
                    .map_err(|e| StoreError::Corrupt { kind, detail: e.to_string() })?,
            ),
            None => None,
        };
        Ok(SeverityTier::from_stored(stored.as_deref()))
    }

    fn set_last_tier(&mut self, kind: SensorKind, tier: SeverityTier) -> Result<(), StoreError> {
        self.client
            .execute(
                "INSERT INTO alert_sensor_state (sensor_kind, last_tier)
                 VALUES ($1, $2)
                 ON CONFLICT (sensor_kind) DO UPDATE SET last_tier = EXCLUDED.last_tier",
                &[&kind.key(), &tier.as_str()],
            )
            .map_err(query_error)?;
        Ok(())
    }

    fn last_alert_at(&mut self, kind: SensorKind) -> Result<DateTime<Utc>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT last_alert_at FROM alert_sensor_state WHERE sensor_kind = $1",
                &[&kind.key()],
            )
            .map_err(query_error)?;

        match row {
            Some(r) => r
                .try_get::<_, DateTime<Utc>>(0)
                .map_err(|e| StoreError::Corrupt { kind, detail: e.to_string() }),
            None => Ok(epoch_zero()),
        }
    }

    fn set_last_alert_at(&mut self, kind: SensorKind, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.client
            .execute(
                "INSERT INTO alert_sensor_state (sensor_kind, last_alert_at)
                 VALUES ($1, $2)
                 ON CONFLICT (sensor_kind) DO UPDATE SET last_alert_at = EXCLUDED.last_alert_at",
                &[&kind.key(), &at],
            )
            .map_err(query_error)?;
        Ok(())
    }
}

fn query_error(e: ::postgres::Error) -> StoreError {
    if e.is_closed() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Query(e.to_string())
    }
}
