//! Rotation job: archive the day's log and render its chart.
//!
//! The archive is named after the local date of the fire time. Once the
//! rename has happened the active log is already fresh; a failure while
//! charting only loses that day's chart.

use chrono::{DateTime, Local};
use tracing::warn;

use super::SharedLog;
use crate::data::chart::write_chart;
use crate::data::reconstruct::reconstruct_file;
use crate::data::{ArtifactLayout, ChartRenderer, EChartsHtmlRenderer};
use crate::error::AppResult;
use crate::scheduler::{Job, JobOutcome};

/// Archives the active log and charts the archived day.
pub struct RotationJob {
    log: SharedLog,
    layout: ArtifactLayout,
    renderer: Box<dyn ChartRenderer>,
}

impl RotationJob {
    /// Rotation with the default ECharts renderer.
    pub fn new(log: SharedLog, layout: ArtifactLayout) -> Self {
        Self::with_renderer(log, layout, Box::new(EChartsHtmlRenderer::default()))
    }

    /// Rotation with a custom renderer.
    pub fn with_renderer(
        log: SharedLog,
        layout: ArtifactLayout,
        renderer: Box<dyn ChartRenderer>,
    ) -> Self {
        Self {
            log,
            layout,
            renderer,
        }
    }
}

impl Job for RotationJob {
    fn name(&self) -> &'static str {
        "rotation"
    }

    fn run(&self, now: DateTime<Local>) -> AppResult<JobOutcome> {
        let date = now.date_naive();
        let archive = self.layout.archive_path(date);

        // Held across close, rename and reopen.
        self.log.lock().rotate(&archive)?;

        let series = reconstruct_file(&archive)?;
        let archive_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if series.is_empty() {
            warn!(archive = %archive.display(), "archive has no records, chart not rendered");
            return Ok(JobOutcome::Skipped(format!("{archive_name} has no records")));
        }

        let chart = series.to_chart(
            format!("HVAC Daily Chart {}", env!("CARGO_PKG_VERSION")),
            format!("Indoor and Outdoor Temperatures from {archive_name}"),
        );
        let chart_path = self.layout.chart_path(date);
        write_chart(self.renderer.as_ref(), &chart, &chart_path)?;

        Ok(JobOutcome::Completed(format!(
            "{archive_name}: {} records charted to {}",
            series.len(),
            chart_path.display()
        )))
    }
}
