//! Custom error types for the application.
//!
//! This module defines the primary error type, `DaqError`, for the whole telemetry
//! pipeline. Using the `thiserror` crate it gives one consistent way to report the
//! failures that can happen while caching device state and maintaining the daily
//! log, archive and chart artifacts.
//!
//! ## Error Hierarchy
//!
//! - **`Config`** / **`Configuration`**: parse errors from figment, and semantic
//!   errors caught by [`crate::config::HvacConfig::validate`].
//! - **`Io`**: any file-system failure. Inside a scheduled job this aborts only
//!   the current invocation; the scheduler logs it and keeps running.
//! - **`StartupLogCreate`**: the active log could not be created at startup. This
//!   is one of the two process-fatal conditions (the other is `Device` while
//!   opening the transport).
//! - **`Device`**: the external transport refused to open.
//! - **`Schedule`** / **`Cron`**: invalid cadence expressions or job names.
//! - **`RotationTargetExists`**: rotation refused to overwrite an existing archive.
//! - **`Render`** / **`Serialization`**: chart generation failures.
//! - **`Csv`**: a log record could not be encoded, or an archive could not be
//!   read back.
//!
//! Transient device query failures and implausible archived values are not
//! errors at this level: the poller skips the cycle, and the reconstruction
//! step forward-fills.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

/// Primary error type for the telemetry pipeline.
#[derive(Error, Debug)]
pub enum DaqError {
    /// The configuration file or environment could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// The configuration parsed but failed validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// File-system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The active log could not be created at startup.
    #[error("Failed to create active log '{}': {source}", path.display())]
    StartupLogCreate {
        /// Active log path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// The device transport could not be opened.
    #[error("Device error: {0}")]
    Device(String),

    /// Unknown job name or unusable cadence.
    #[error("Schedule error: {0}")]
    Schedule(String),

    /// Cron expression did not parse.
    #[error("Invalid cadence expression: {0}")]
    Cron(#[from] cron::error::Error),

    /// Rotation target already exists.
    #[error("Archive '{}' already exists, refusing to overwrite", .0.display())]
    RotationTargetExists(PathBuf),

    /// Chart rendering failed.
    #[error("Chart rendering error: {0}")]
    Render(String),

    /// Chart options could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Log record encoding or decoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DaqError {
    /// Whether this error must stop the process instead of a single job run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DaqError::StartupLogCreate { .. } | DaqError::Device(_) | DaqError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_and_are_recoverable() {
        let err: DaqError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert!(matches!(err, DaqError::Io(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn startup_log_failure_is_fatal() {
        let err = DaqError::StartupLogCreate {
            path: PathBuf::from("/nope/Infinitive.csv"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/nope/Infinitive.csv"));
    }

    #[test]
    fn rotation_conflict_names_the_archive() {
        let err = DaqError::RotationTargetExists(PathBuf::from("2024-03-01_Infinitive.csv"));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("2024-03-01_Infinitive.csv"));
    }
}
