//! The scheduled jobs.
//!
//! | job | default cadence | touches |
//! |---|---|---|
//! | [`AppendJob`] | every 4 minutes | active log |
//! | [`RotationJob`] | daily 23:59:02 | active log, archive, chart |
//! | [`RetentionJob`] | daily 00:05:03 | archives, charts, index |
//! | [`LogPurgeJob`] | 1st and 15th, 01:00:04 | diagnostic logs |
//!
//! Append and rotation share the active log behind one mutex.

pub mod append;
pub mod purge;
pub mod retention;
pub mod rotation;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::data::ActiveLog;

pub use append::AppendJob;
pub use purge::LogPurgeJob;
pub use retention::RetentionJob;
pub use rotation::RotationJob;

/// Active log handle shared by the append and rotation jobs.
pub type SharedLog = Arc<Mutex<ActiveLog>>;
