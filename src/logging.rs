//! Diagnostic logging for the daemon, built on `tracing` / `tracing-subscriber`.
//!
//! Events carry structured fields (`job = "rotation"`, `path = %path.display()`)
//! and go to stderr in one of three layouts. `RUST_LOG`, when set, overrides the
//! configured level. With `logging.to_file` the same events are also appended
//! to `<logging.dir>/hvac_daq.log`.
//!
//! ```no_run
//! use hvac_daq::{config::HvacConfig, logging};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HvacConfig::load_from("config/hvac_daq.toml")?;
//! logging::init_from_config(&config)?;
//! tracing::info!(job = "append", "daemon starting");
//! # Ok(())
//! # }
//! ```

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::fmt::{self, writer::OptionalWriter, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::HvacConfig;

/// File name used for the diagnostic log inside `logging.dir`.
pub const DIAGNOSTIC_LOG_NAME: &str = "hvac_daq.log";

/// Console layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Multi-line, colored; for a terminal
    Pretty,
    /// One line per event; the service default
    Compact,
    /// One JSON object per event
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{other}', expected pretty, compact or json"
            )),
        }
    }
}

/// Subscriber settings derived from [`HvacConfig`].
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Maximum level when `RUST_LOG` is unset
    pub level: Level,
    /// Console layout
    pub format: OutputFormat,
    /// Source file and line in every event
    pub with_file_and_line: bool,
    /// Thread name in every event
    pub with_thread_names: bool,
    /// Colors; only honored by [`OutputFormat::Pretty`]
    pub with_ansi: bool,
    /// Also append events to this file
    pub log_file: Option<PathBuf>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: OutputFormat::Compact,
            with_file_and_line: false,
            with_thread_names: true,
            with_ansi: true,
            log_file: None,
        }
    }
}

impl TracingConfig {
    /// Settings from the `[application]` and `[logging]` sections.
    pub fn from_config(config: &HvacConfig) -> Result<Self, String> {
        let level = parse_level(&config.application.log_level)?;
        let format = config.application.log_format.parse()?;
        let log_file = config
            .logging
            .to_file
            .then(|| config.logging.dir.join(DIAGNOSTIC_LOG_NAME));

        Ok(Self {
            level,
            format,
            log_file,
            ..Self::default()
        })
    }
}

/// Writer that re-opens its file in append mode for every record.
///
/// The log-purge job deletes `*.log` files without coordinating with the
/// subscriber, so holding a descriptor would keep writing into an unlinked inode.
#[derive(Debug, Clone)]
pub struct ReopeningFileWriter {
    path: PathBuf,
}

impl ReopeningFileWriter {
    /// Writer appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<'a> MakeWriter<'a> for ReopeningFileWriter {
    type Writer = OptionalWriter<File>;

    fn make_writer(&'a self) -> Self::Writer {
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(file) => OptionalWriter::some(file),
            Err(_) => OptionalWriter::none(),
        }
    }
}

/// [`init`] with settings taken from the application configuration.
pub fn init_from_config(config: &HvacConfig) -> Result<(), String> {
    init(TracingConfig::from_config(config)?)
}

/// Install the global subscriber.
///
/// A second call is a no-op, so tests may call it freely.
pub fn init(config: TracingConfig) -> Result<(), String> {
    let default_directive = config.level.as_str().to_ascii_lowercase();
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_directive))
    };

    let file_layer = config.log_file.as_ref().map(|path| {
        fmt::layer()
            .with_writer(ReopeningFileWriter::new(path.clone()))
            .with_ansi(false)
            .with_target(true)
            .with_filter(filter())
    });

    let console_layer = match config.format {
        OutputFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_thread_names(config.with_thread_names)
            .with_ansi(config.with_ansi)
            .with_filter(filter())
            .boxed(),
        OutputFormat::Compact => fmt::layer()
            .compact()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_thread_names(config.with_thread_names)
            .with_ansi(false)
            .with_filter(filter())
            .boxed(),
        OutputFormat::Json => fmt::layer()
            .json()
            .with_file(config.with_file_and_line)
            .with_line_number(config.with_file_and_line)
            .with_thread_names(config.with_thread_names)
            .with_filter(filter())
            .boxed(),
    };

    match tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        Ok(()) => Ok(()),
        // Already installed (repeated init in tests).
        Err(e) if e.to_string().contains("already") => Ok(()),
        Err(e) => Err(format!("cannot install tracing subscriber: {e}")),
    }
}

fn parse_level(level: &str) -> Result<Level, String> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Level::from_str(level)
            .map_err(|e| format!("invalid log level '{level}': {e}")),
        _ => Err(format!(
            "unknown log level '{level}', expected trace, debug, info, warn or error"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level("trace"), Ok(Level::TRACE));
        assert_eq!(parse_level("Debug"), Ok(Level::DEBUG));
        assert_eq!(parse_level("WARN"), Ok(Level::WARN));
        assert!(parse_level("loud").is_err());
        assert!(parse_level("3").is_err());
    }

    #[test]
    fn formats_parse() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("Pretty".parse::<OutputFormat>(), Ok(OutputFormat::Pretty));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn settings_follow_application_config() {
        let mut config = HvacConfig::default();
        config.application.log_level = "debug".to_string();
        config.application.log_format = "json".to_string();
        config.logging.to_file = true;
        config.logging.dir = PathBuf::from("/tmp/hvac-logs");

        let tracing_config = TracingConfig::from_config(&config).unwrap();
        assert_eq!(tracing_config.level, Level::DEBUG);
        assert_eq!(tracing_config.format, OutputFormat::Json);
        assert_eq!(
            tracing_config.log_file,
            Some(PathBuf::from("/tmp/hvac-logs/hvac_daq.log"))
        );

        config.logging.to_file = false;
        assert_eq!(TracingConfig::from_config(&config).unwrap().log_file, None);
    }

    #[test]
    fn repeated_init_is_tolerated() {
        assert!(init(TracingConfig::default()).is_ok());
        assert!(init(TracingConfig::default()).is_ok());
    }

    #[test]
    fn reopening_writer_survives_deletion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DIAGNOSTIC_LOG_NAME);
        let writer = ReopeningFileWriter::new(&path);

        writer.make_writer().write_all(b"first\n").unwrap();
        std::fs::remove_file(&path).unwrap();
        writer.make_writer().write_all(b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
    }
}
