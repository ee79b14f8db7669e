//! File-system layout of the active log and its derived artifacts.
//!
//! ```text
//! <data_dir>/Infinitive.csv                      active log
//! <data_dir>/2024-03-17_Infinitive.csv           archive
//! <data_dir>/2024-03-17_Temperature.html         chart
//! <data_dir>/htmlLinks.html                      index
//! ```

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;

/// Kind of dated artifact found in the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Rotated log, `YYYY-MM-DD_<active log name>`
    Archive,
    /// Daily chart, `YYYY-MM-DD<chart suffix>`
    Chart,
}

/// Paths derived from the storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    /// Directory holding every artifact
    pub data_dir: PathBuf,
    /// File name of the active log
    pub active_log_name: String,
    /// Suffix after the date in chart names
    pub chart_suffix: String,
    /// File name of the chart index
    pub index_name: String,
}

impl ArtifactLayout {
    /// Default names under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(&StorageConfig {
            data_dir: data_dir.into(),
            ..StorageConfig::default()
        })
    }

    /// Layout described by the `[storage]` section.
    pub fn from_config(storage: &StorageConfig) -> Self {
        Self {
            data_dir: storage.data_dir.clone(),
            active_log_name: storage.active_log_name.clone(),
            chart_suffix: storage.chart_suffix.clone(),
            index_name: storage.index_name.clone(),
        }
    }

    /// Directory holding every artifact.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the active log.
    pub fn active_log_path(&self) -> PathBuf {
        self.data_dir.join(&self.active_log_name)
    }

    /// Archive path for the day `date`.
    pub fn archive_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}", date.format("%Y-%m-%d"), self.active_log_name))
    }

    /// Chart path for the day `date`.
    pub fn chart_path(&self, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("{}{}", date.format("%Y-%m-%d"), self.chart_suffix))
    }

    /// Path of the chart index.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(&self.index_name)
    }

    /// Recognize a dated archive or chart by file name.
    ///
    /// The active log and the index never match: both lack the date prefix.
    pub fn classify(&self, file_name: &str) -> Option<(ArtifactKind, NaiveDate)> {
        let prefix = file_name.get(..10)?;
        let date = NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()?;
        let rest = &file_name[10..];

        if rest.strip_prefix('_') == Some(self.active_log_name.as_str()) {
            Some((ArtifactKind::Archive, date))
        } else if rest == self.chart_suffix {
            Some((ArtifactKind::Chart, date))
        } else {
            None
        }
    }

    /// Whether `file_name` looks like a chart artifact.
    pub fn is_chart(&self, file_name: &str) -> bool {
        matches!(self.classify(file_name), Some((ArtifactKind::Chart, _)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ArtifactLayout {
        ArtifactLayout::new("/var/lib/hvac_daq")
    }

    #[test]
    fn dated_paths() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            layout().archive_path(date),
            PathBuf::from("/var/lib/hvac_daq/2024-03-07_Infinitive.csv")
        );
        assert_eq!(
            layout().chart_path(date),
            PathBuf::from("/var/lib/hvac_daq/2024-03-07_Temperature.html")
        );
        assert_eq!(
            layout().index_path(),
            PathBuf::from("/var/lib/hvac_daq/htmlLinks.html")
        );
    }

    #[test]
    fn classify_artifacts() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let l = layout();
        assert_eq!(
            l.classify("2024-03-07_Infinitive.csv"),
            Some((ArtifactKind::Archive, date))
        );
        assert_eq!(
            l.classify("2024-03-07_Temperature.html"),
            Some((ArtifactKind::Chart, date))
        );
        assert_eq!(l.classify("Infinitive.csv"), None);
        assert_eq!(l.classify("htmlLinks.html"), None);
        assert_eq!(l.classify("2024-13-07_Temperature.html"), None);
        assert_eq!(l.classify("2024-03-07_notes.txt"), None);
        assert!(!l.is_chart("2024-03-07_Infinitive.csv"));
    }
}
