/// Service configuration.
///
/// Settings come from an optional TOML file (path from `AQUAMON_CONFIG`,
/// default `./aquamon.toml`) with `.env` support through `dotenv`. Every
/// field has a default, so an empty or missing file yields a working
/// configuration.
///
/// ```toml
/// cooldown_secs = 300
/// log_level = "info"
///
/// [automation]
/// water_temp = false
///
/// [thresholds.ph]
/// shape = "two_sided"
/// excellent = { min = 6.8, max = 7.2 }
/// acceptable = { min = 6.4, max = 7.6 }
/// caution = { min = 6.0, max = 8.0 }
/// ```

use crate::alert::cooldown::{default_cooldown, DEFAULT_COOLDOWN_SECS};
use crate::alert::engine::{AlertEngine, AutomationModes};
use crate::logging::LogLevel;
use crate::model::SensorKind;
use crate::sensors::{ThresholdError, ThresholdTable};
use chrono::Duration;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "./aquamon.toml";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Minimum seconds between two alerts for the same sensor.
    pub cooldown_secs: i64,
    pub log_level: String,
    pub log_file: Option<String>,
    pub console_timestamps: bool,
    /// Sensor name → automatic mode. Overrides the commands document.
    pub automation: HashMap<String, bool>,
    pub thresholds: ThresholdTable,
    /// From `DATABASE_URL`; selects the Postgres store when set.
    #[serde(skip)]
    pub database_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            log_level: "info".to_string(),
            log_file: None,
            console_timestamps: false,
            automation: HashMap::new(),
            thresholds: ThresholdTable::default(),
            database_url: None,
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_name(&self.log_level)
    }

    /// Falls back to the default window when `cooldown_secs` is out of
    /// range; `validate` rejects such values up front.
    pub fn cooldown(&self) -> Duration {
        Duration::try_seconds(self.cooldown_secs).unwrap_or_else(default_cooldown)
    }

    pub fn engine(&self) -> AlertEngine {
        AlertEngine::new(self.thresholds.clone(), self.cooldown())
    }

    /// Automation overrides keyed by sensor. Names are resolved with
    /// `SensorKind::from_name`; `validate` has already rejected unknown ones.
    pub fn automation_modes(&self) -> AutomationModes {
        let mut modes = AutomationModes::new();
        for (name, automatic) in &self.automation {
            if let Some(kind) = SensorKind::from_name(name) {
                modes.set_sensor(kind, *automatic);
            }
        }
        modes
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cooldown_secs < 0 {
            return Err(ConfigError::Invalid(format!(
                "cooldown_secs must not be negative, got {}",
                self.cooldown_secs
            )));
        }
        if Duration::try_seconds(self.cooldown_secs).is_none() {
            return Err(ConfigError::Invalid(format!(
                "cooldown_secs is out of range, got {}",
                self.cooldown_secs
            )));
        }
        if let Some(name) = self.automation.keys().find(|n| SensorKind::from_name(n).is_none()) {
            return Err(ConfigError::Invalid(format!("unknown sensor '{}' in [automation]", name)));
        }
        self.thresholds.validate().map_err(ConfigError::Thresholds)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parses and validates configuration from TOML text.
pub fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_config(&text)
}

/// Loads `.env`, then the config file named by `AQUAMON_CONFIG`.
///
/// Without `AQUAMON_CONFIG`, `./aquamon.toml` is used if it exists and the
/// built-in defaults otherwise. `DATABASE_URL` is copied into the result.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    dotenv::dotenv().ok();

    let mut config = match env::var("AQUAMON_CONFIG") {
        Ok(path) => load_config(Path::new(&path))?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            load_config(Path::new(DEFAULT_CONFIG_PATH))?
        }
        Err(_) => AppConfig::default(),
    };
    config.database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
    Ok(config)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    Invalid(String),
    Thresholds(ThresholdError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Cannot read config file {}: {}", path, message)
            }
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
            ConfigError::Thresholds(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
