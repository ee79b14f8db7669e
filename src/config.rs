//! Configuration System using Figment
//!
//! Strongly-typed configuration, read once at startup and never mutated afterwards.
//! Configuration is loaded from:
//! 1. a TOML file (base configuration, optional)
//! 2. Environment variables (prefixed with `HVAC_DAQ_`, nested keys split on `__`)
//!
//! Every key has a default, so a missing file yields a usable configuration.
//!
//! # Example
//! ```no_run
//! use hvac_daq::config::HvacConfig;
//!
//! let config = HvacConfig::load_from("config/hvac_daq.toml")?;
//! println!("Data directory: {}", config.storage.data_dir.display());
//! # Ok::<(), hvac_daq::error::DaqError>(())
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppResult, DaqError};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HvacConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Device transport settings
    #[serde(default)]
    pub device: DeviceConfig,
    /// Log, archive, chart and index file settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Diagnostic log settings
    #[serde(default)]
    pub logging: LoggingFileConfig,
    /// Cadence expressions for the scheduled jobs
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Device transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Transport path handed to the protocol engine (e.g. a serial port)
    #[serde(default = "default_transport")]
    pub transport: String,
    /// Interval between state polls in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

/// Storage configuration for the append log and its derived artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the active log, archives, charts and the index
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// File name of the active log
    #[serde(default = "default_active_log_name")]
    pub active_log_name: String,
    /// Suffix appended to the date for chart artifacts
    #[serde(default = "default_chart_suffix")]
    pub chart_suffix: String,
    /// File name of the generated index page
    #[serde(default = "default_index_name")]
    pub index_name: String,
    /// Archives and charts older than this many days are deleted
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

/// Diagnostic log file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingFileConfig {
    /// Directory of the diagnostic `*.log` files purged twice a month
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Also append tracing output to `<dir>/hvac_daq.log`
    #[serde(default)]
    pub to_file: bool,
}

/// Seconds-granularity cron expressions (sec min hour day month weekday)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Append job cadence
    #[serde(default = "default_append_cadence")]
    pub append: String,
    /// Rotation job cadence
    #[serde(default = "default_rotation_cadence")]
    pub rotation: String,
    /// Retention job cadence
    #[serde(default = "default_retention_cadence")]
    pub retention: String,
    /// Log purge job cadence
    #[serde(default = "default_log_purge_cadence")]
    pub log_purge: String,
}

// Default value functions
fn default_name() -> String {
    "hvac_daq".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_transport() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/var/lib/hvac_daq")
}

fn default_active_log_name() -> String {
    "Infinitive.csv".to_string()
}

fn default_chart_suffix() -> String {
    "_Temperature.html".to_string()
}

fn default_index_name() -> String {
    "htmlLinks.html".to_string()
}

fn default_retention_days() -> u32 {
    14
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/hvac_daq")
}

fn default_append_cadence() -> String {
    "0 */4 * * * *".to_string()
}

fn default_rotation_cadence() -> String {
    "2 59 23 * * *".to_string()
}

fn default_retention_cadence() -> String {
    "3 5 0 * * *".to_string()
}

fn default_log_purge_cadence() -> String {
    "4 0 1 1,15 * *".to_string()
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            active_log_name: default_active_log_name(),
            chart_suffix: default_chart_suffix(),
            index_name: default_index_name(),
            retention_days: default_retention_days(),
        }
    }
}

impl Default for LoggingFileConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            to_file: false,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            append: default_append_cadence(),
            rotation: default_rotation_cadence(),
            retention: default_retention_cadence(),
            log_purge: default_log_purge_cadence(),
        }
    }
}

impl HvacConfig {
    /// Load configuration from a specific file path plus `HVAC_DAQ_` environment overrides
    ///
    /// Example: `HVAC_DAQ_STORAGE__RETENTION_DAYS=7`
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config: Self = Figment::from(Serialized::defaults(HvacConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("HVAC_DAQ_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(DaqError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let valid_formats = ["pretty", "compact", "json"];
        if !valid_formats.contains(&self.application.log_format.as_str()) {
            return Err(DaqError::Configuration(format!(
                "Invalid log_format '{}'. Must be one of: {}",
                self.application.log_format,
                valid_formats.join(", ")
            )));
        }

        if self.device.poll_interval_ms == 0 {
            return Err(DaqError::Configuration(
                "poll_interval_ms must be greater than zero".into(),
            ));
        }

        for (key, name) in [
            ("active_log_name", &self.storage.active_log_name),
            ("index_name", &self.storage.index_name),
        ] {
            if name.is_empty() || name.contains('/') {
                return Err(DaqError::Configuration(format!(
                    "{key} must be a plain, non-empty file name (got '{name}')"
                )));
            }
        }

        if !self.storage.chart_suffix.ends_with(".html") {
            return Err(DaqError::Configuration(format!(
                "chart_suffix '{}' must end with .html",
                self.storage.chart_suffix
            )));
        }

        if self.storage.retention_days == 0 {
            return Err(DaqError::Configuration(
                "retention_days must be at least 1".into(),
            ));
        }

        for (job, expr) in self.schedule.entries() {
            cron::Schedule::from_str(expr).map_err(|e| {
                DaqError::Configuration(format!("Invalid {job} cadence '{expr}': {e}"))
            })?;
        }

        Ok(())
    }

    /// Interval between state polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.device.poll_interval_ms)
    }
}

impl ScheduleConfig {
    /// `(job name, cron expression)` pairs in dispatch order
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("append", self.append.as_str()),
            ("rotation", self.rotation.as_str()),
            ("retention", self.retention.as_str()),
            ("log_purge", self.log_purge.as_str()),
        ]
    }
}
