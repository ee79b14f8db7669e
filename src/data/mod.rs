//! Data persistence and artifacts.
//!
//! - [`log_record`]: the versioned record schema of the append-only log
//! - [`active_log`]: the live log file (append, rotate)
//! - [`reconstruct`]: archived-log replay into chartable series
//! - [`chart`]: chart rendering
//! - [`index`]: the HTML index of retained charts
//! - [`layout`]: where each artifact lives on disk
pub mod active_log;
pub mod chart;
pub mod index;
pub mod layout;
pub mod log_record;
pub mod reconstruct;

pub use active_log::ActiveLog;
pub use chart::{ChartRenderer, EChartsHtmlRenderer, LineChart, Series};
pub use layout::{ArtifactKind, ArtifactLayout};
pub use reconstruct::DailySeries;
