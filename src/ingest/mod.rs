/// Decoding of upstream device documents.
///
/// Submodules:
/// - `snapshot`: live sensor snapshot and actuator command documents.

pub mod snapshot;

pub use snapshot::{automation_modes, parse_commands, parse_snapshot, DecodeError, LiveSnapshot};
