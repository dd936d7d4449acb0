pub mod alert;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod sensors;
pub mod store;

pub use alert::{AlertEngine, AutomationModes, Evaluation};
pub use model::{AlertLevel, AlertRecord, Reading, SensorKind, SeverityTier};
pub use sensors::ThresholdTable;
pub use store::{InMemoryTransitionStore, PostgresTransitionStore, TransitionStore};
