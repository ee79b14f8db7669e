//! Retention job: expire old archives and charts, then rebuild the index.

use chrono::{DateTime, Duration, Local};
use std::fs;
use std::time::SystemTime;
use tracing::{info, warn};

use crate::data::index::write_index;
use crate::data::ArtifactLayout;
use crate::error::AppResult;
use crate::scheduler::{Job, JobOutcome};

/// Whether a file last modified at `modified` is strictly older than `window` at `now`.
pub fn is_expired(modified: SystemTime, now: DateTime<Local>, window: Duration) -> bool {
    let modified: DateTime<Local> = modified.into();
    now.signed_duration_since(modified) > window
}

/// Expires dated artifacts and regenerates the chart index.
pub struct RetentionJob {
    layout: ArtifactLayout,
    window: Duration,
}

impl RetentionJob {
    /// Keep artifacts for `retention_days` days.
    pub fn new(layout: ArtifactLayout, retention_days: u32) -> Self {
        Self {
            layout,
            window: Duration::days(i64::from(retention_days)),
        }
    }

    /// Delete expired archives and charts. Returns how many were removed.
    ///
    /// A file that cannot be inspected or removed is logged and left for the next run.
    pub fn expire(&self, now: DateTime<Local>) -> AppResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(self.layout.data_dir())? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if self.layout.classify(name).is_none() {
                continue;
            }

            let path = entry.path();
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "cannot read modification time");
                    continue;
                }
            };
            if !is_expired(modified, now, self.window) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "expired artifact removed");
                    removed += 1;
                }
                Err(err) => warn!(path = %path.display(), error = %err, "cannot remove expired artifact"),
            }
        }
        Ok(removed)
    }
}

impl Job for RetentionJob {
    fn name(&self) -> &'static str {
        "retention"
    }

    fn run(&self, now: DateTime<Local>) -> AppResult<JobOutcome> {
        let removed = self.expire(now)?;
        let indexed = write_index(&self.layout, false, now)?;
        Ok(JobOutcome::Completed(format!(
            "{removed} expired, {indexed} charts indexed"
        )))
    }
}
