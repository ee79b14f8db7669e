//! Daily series reconstruction from an archived log.
//!
//! Reads an archive record by record, drops headers, forward-fills implausible
//! temperatures and buckets blower RPM into fan-speed tiers. Records are read
//! as raw bytes, so a damaged line costs at most its own fields.

use csv::ByteRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use super::chart::{LineChart, Series};
use super::log_record::{record_reader, ArchivedRecord};
use crate::error::AppResult;

/// Outdoor readings above this are treated as garbage.
pub const OUTDOOR_CEILING: u32 = 130;
/// Indoor readings above this are treated as garbage.
pub const INDOOR_CEILING: u32 = 110;

/// Map blower RPM to a fan-speed percentage tier.
pub fn fan_bucket(rpm: u32) -> u32 {
    match rpm {
        0..=199 => 0,
        200..=549 => 34,
        550..=749 => 66,
        _ => 100,
    }
}

/// Last-known-good substitution for one channel.
///
/// The first value is taken as-is, even when it would fail the plausibility
/// check, so there is always a previous value to fall back to.
#[derive(Debug, Clone)]
struct ForwardFill {
    ceiling: u32,
    last: Option<u32>,
}

impl ForwardFill {
    fn new(ceiling: u32) -> Self {
        Self {
            ceiling,
            last: None,
        }
    }

    fn accept(&mut self, value: u32) -> u32 {
        let value = match self.last {
            Some(last) if value == 0 || value > self.ceiling => last,
            _ => value,
        };
        self.last = Some(value);
        value
    }
}

/// One day of chartable samples, all vectors the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    /// x-axis values
    pub frac_day: Vec<f64>,
    /// Indoor temperature after forward-fill
    pub indoor: Vec<u32>,
    /// Outdoor temperature after forward-fill
    pub outdoor: Vec<u32>,
    /// Fan speed tier, see [`fan_bucket`]
    pub fan_pct: Vec<u32>,
}

impl DailySeries {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.frac_day.len()
    }

    /// True when the archive held no data lines.
    pub fn is_empty(&self) -> bool {
        self.frac_day.is_empty()
    }

    /// Build the daily line chart for this series.
    pub fn to_chart(&self, title: impl Into<String>, subtitle: impl Into<String>) -> LineChart {
        let x_axis = self.frac_day.iter().map(|v| format!("{v:.4}")).collect();
        let to_f64 = |values: &[u32]| values.iter().map(|v| f64::from(*v)).collect::<Vec<_>>();

        LineChart {
            title: title.into(),
            subtitle: subtitle.into(),
            x_axis,
            series: vec![
                Series::new("Indoor Temp", to_f64(&self.indoor)),
                Series::new("Outdoor Temp", to_f64(&self.outdoor)),
                Series::new("Fan RPM%", to_f64(&self.fan_pct)),
            ],
        }
    }
}

/// Replay archived log lines into a [`DailySeries`].
///
/// Only a failing reader is an error. Unreadable records are skipped and
/// unreadable fields go through forward-fill.
pub fn reconstruct<R: Read>(reader: R) -> AppResult<DailySeries> {
    let mut series = DailySeries::default();
    let mut outdoor = ForwardFill::new(OUTDOOR_CEILING);
    let mut indoor = ForwardFill::new(INDOOR_CEILING);
    let mut skipped = 0usize;

    let mut records = record_reader(reader);
    let mut raw = ByteRecord::new();
    loop {
        match records.read_byte_record(&mut raw) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                debug!(error = %err, "unreadable archive record");
                skipped += 1;
                continue;
            }
        }
        let Some(record) = ArchivedRecord::from_record(&raw) else {
            skipped += 1;
            continue;
        };

        series.frac_day.push(record.frac_day);
        series.outdoor.push(outdoor.accept(record.outdoor_temp));
        series.indoor.push(indoor.accept(record.current_temp));
        series.fan_pct.push(fan_bucket(record.blower_rpm));
    }

    debug!(records = series.len(), skipped, "archive replayed");
    Ok(series)
}

/// [`reconstruct`] an archive file on disk.
pub fn reconstruct_file(path: &Path) -> AppResult<DailySeries> {
    reconstruct(File::open(path)?)
}
