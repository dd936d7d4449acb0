/// Alert evaluation.
///
/// Submodules:
/// - `classify`: value → severity tier against the threshold table
/// - `cooldown`: per-sensor suppression window
/// - `guidance`: human-readable titles and corrective advice
/// - `engine`: edge-triggered transitions tying the above together

pub mod classify;
pub mod cooldown;
pub mod engine;
pub mod guidance;

pub use classify::classify;
pub use engine::{AcknowledgeError, AlertEngine, AutomationModes, Evaluation, KindFailure};
pub use guidance::guidance;
