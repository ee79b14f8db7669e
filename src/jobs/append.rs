//! Append job: one log record per tick from the current snapshots.

use chrono::{DateTime, Local};
use std::sync::Arc;

use super::SharedLog;
use crate::data::log_record::format_record;
use crate::error::AppResult;
use crate::scheduler::{Job, JobOutcome};
use crate::snapshot::SnapshotStore;

/// Writes the derived scalars as one record to the shared active log.
pub struct AppendJob {
    store: Arc<SnapshotStore>,
    log: SharedLog,
}

impl AppendJob {
    /// Append from `store` into `log`.
    pub fn new(store: Arc<SnapshotStore>, log: SharedLog) -> Self {
        Self { store, log }
    }
}

impl Job for AppendJob {
    fn name(&self) -> &'static str {
        "append"
    }

    fn run(&self, now: DateTime<Local>) -> AppResult<JobOutcome> {
        let line = format_record(&now, &self.store.derived_scalars())?;
        self.log.lock().append(&line)?;
        Ok(JobOutcome::Completed(line.trim_end().to_string()))
    }
}
