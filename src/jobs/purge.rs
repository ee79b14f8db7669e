//! Log purge job: clears the diagnostic-log directory.

use chrono::{DateTime, Local};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::scheduler::{Job, JobOutcome};

/// Removes `*.log` files from the diagnostic-log directory.
pub struct LogPurgeJob {
    dir: PathBuf,
}

impl LogPurgeJob {
    /// Purge job for `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Job for LogPurgeJob {
    fn name(&self) -> &'static str {
        "log_purge"
    }

    fn run(&self, _now: DateTime<Local>) -> AppResult<JobOutcome> {
        let mut removed = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("log")
            {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) => warn!(path = %path.display(), error = %err, "cannot remove log file"),
            }
        }
        info!(dir = %self.dir.display(), removed, "diagnostic logs purged");
        Ok(JobOutcome::Completed(format!("{removed} log files removed")))
    }
}
