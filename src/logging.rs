/// Structured logging for the alert service
///
/// Provides context-rich logging with component and sensor identifiers,
/// timestamps, and severity levels. Supports both console output and
/// file-based logging for long-running deployments.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses a config-file level name. Unknown names fall back to `Info`.
    pub fn from_name(name: &str) -> LogLevel {
        match name.trim().to_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Engine,
    Store,
    Config,
    Ingest,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Engine => write!(f, "ENGINE"),
            Component::Store => write!(f, "STORE"),
            Component::Config => write!(f, "CONFIG"),
            Component::Ingest => write!(f, "INGEST"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, component: &Component, sensor: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let sensor_part = sensor.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, component, sensor_part, message)
    }

    fn log(&self, level: LogLevel, component: &Component, sensor: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, component, sensor, message);
        let sensor_part = sensor.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output goes to stderr so stdout stays clean for alert JSON.
        if self.console_timestamps {
            eprintln!("{}", log_entry);
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, sensor_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, sensor_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, component: Component, sensor: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &component, sensor, message);
        }
    }
}

/// Log a general informational message
pub fn info(component: Component, sensor: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, sensor, message);
}

/// Log a warning message
pub fn warn(component: Component, sensor: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, sensor, message);
}

/// Log an error message
pub fn error(component: Component, sensor: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, sensor, message);
}

/// Log a debug message
pub fn debug(component: Component, sensor: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, sensor, message);
}

// ---------------------------------------------------------------------------
// Evaluation Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one evaluation cycle.
///
/// Level follows the failure ratio: all kinds evaluated is INFO, some
/// failed is WARN, none evaluated is ERROR.
pub fn log_evaluation_summary(evaluated: usize, alerts: usize, failed: usize) {
    let total = evaluated + failed;
    let message = format!(
        "Evaluation complete: {}/{} readings evaluated, {} alert(s), {} failed",
        evaluated, total, alerts, failed
    );

    if failed == 0 {
        info(Component::Engine, None, &message);
    } else if evaluated == 0 {
        error(Component::Engine, None, &message);
    } else {
        warn(Component::Engine, None, &message);
    }
}
