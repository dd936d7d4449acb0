/// Per-sensor alert cooldown.
///
/// After an alert fires for a sensor, further alerts for that sensor are
/// suppressed until the cooldown has elapsed. The window is per sensor
/// kind, not per tier: a Caution→Critical escalation inside the window is
/// suppressed too.
///
/// # Clock injection
/// Nothing here calls `Utc::now()`. The engine passes the reading's own
/// timestamp as `now`, which keeps replays of recorded data and tests
/// fully deterministic.

use chrono::{DateTime, Duration, Utc};

/// Default minimum spacing between two alerts for the same sensor.
pub const DEFAULT_COOLDOWN_SECS: i64 = 5 * 60;

pub fn default_cooldown() -> Duration {
    Duration::seconds(DEFAULT_COOLDOWN_SECS)
}

/// Returns `true` if an alert at `now` would fall inside the cooldown that
/// started at `last_alert_at`.
///
/// The window is half-open:
///   elapsed <  cooldown  →  suppressed
///   elapsed == cooldown  →  allowed
///
/// A `now` earlier than `last_alert_at` (clock skew, out-of-order replay)
/// yields a negative elapsed time and is treated as inside the window.
pub fn is_within_cooldown_at(
    last_alert_at: DateTime<Utc>,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> bool {
    now.signed_duration_since(last_alert_at) < cooldown
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
