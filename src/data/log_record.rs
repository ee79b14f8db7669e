//! Log Record schema (version 1).
//!
//! One comma-delimited line per append tick:
//!
//! ```text
//! 2024-03-17T12:30:00,0017.5208,0068,0076,0045,0070,0600,heat
//! ```
//!
//! | field | width | meaning |
//! |---|---|---|
//! | timestamp | 19 | local time, `%Y-%m-%dT%H:%M:%S` |
//! | frac day | 9 | day of month plus fraction of day, 4 decimals |
//! | heat set | 4 | heat setpoint |
//! | cool set | 4 | cool setpoint |
//! | outdoor | 4 | outdoor temperature |
//! | current | 4 | indoor temperature |
//! | blower | 4 | blower RPM |
//! | mode | - | operating mode string |
//!
//! Fixed widths keep every field at a stable character offset, but the reader
//! goes through the `csv` crate and only relies on the delimiter. Every file
//! starts with [`HEADER`]. Fields are never quoted.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike};
use csv::{ByteRecord, QuoteStyle, Reader, ReaderBuilder, Terminator, WriterBuilder};
use std::io::{self, Read};

use crate::error::{AppResult, DaqError};
use crate::snapshot::DerivedScalars;

/// Header line written once at the top of every log file.
pub const HEADER: &str = "Date,Time,FracTime,HeatSet,CoolSet,OutdoorTemp,CurrentTemp,BlowerRPM";

/// Record layout version.
pub const SCHEMA_VERSION: u32 = 1;

/// Number of comma-separated fields in a data line.
pub const FIELD_COUNT: usize = 8;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Hours-to-fraction factor of the frac-day axis (~100/24).
const FRAC_DAY_SCALE: f64 = 4.16667;

/// Day of month plus the elapsed fraction of the day, at minute resolution.
pub fn fractional_day<Tz: TimeZone>(at: &DateTime<Tz>) -> f64 {
    let hours = f64::from(at.hour()) + f64::from(at.minute()) / 60.0;
    f64::from(at.day()) + FRAC_DAY_SCALE * hours / 100.0
}

/// Format one record line (with trailing newline) for `scalars` at `at`.
pub fn format_record<Tz: TimeZone>(at: &DateTime<Tz>, scalars: &DerivedScalars) -> AppResult<String>
where
    Tz::Offset: std::fmt::Display,
{
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(64));

    writer.write_record([
        at.format(TIMESTAMP_FORMAT).to_string(),
        format!("{:09.4}", fractional_day(at)),
        format!("{:04}", scalars.heat_setpoint),
        format!("{:04}", scalars.cool_setpoint),
        format!("{:04}", scalars.outdoor_temp),
        format!("{:04}", scalars.current_temp),
        format!("{:04}", scalars.blower_rpm),
        scalars.mode.clone(),
    ])?;

    let bytes = writer
        .into_inner()
        .map_err(|e| DaqError::Io(io::Error::new(e.error().kind(), e.error().to_string())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Whether `record` is a header (written at file creation).
pub fn is_header(record: &ByteRecord) -> bool {
    record.get(0).is_some_and(|f| f.starts_with(b"D"))
}

/// CSV reader for log files: no header handling, ragged rows allowed.
///
/// Quoting is off so a stray `"` in a damaged line cannot swallow the lines
/// after it.
pub fn record_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader)
}

/// A data line read back from an archive.
///
/// Integer fields that fail to parse (including bytes that are not UTF-8)
/// read as 0, which the reconstruction step treats like any other
/// implausible value.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedRecord {
    /// Sample time; `None` when the field is unreadable
    pub timestamp: Option<NaiveDateTime>,
    /// Chart x-axis value
    pub frac_day: f64,
    /// Heat setpoint
    pub heat_setpoint: u32,
    /// Cool setpoint
    pub cool_setpoint: u32,
    /// Outdoor temperature
    pub outdoor_temp: u32,
    /// Indoor temperature
    pub current_temp: u32,
    /// Blower RPM
    pub blower_rpm: u32,
    /// Operating mode string
    pub mode: String,
}

impl ArchivedRecord {
    /// Interpret one CSV record. Headers, short records and records without a
    /// readable frac-day value yield `None`.
    pub fn from_record(record: &ByteRecord) -> Option<Self> {
        if record.len() < FIELD_COUNT || is_header(record) {
            return None;
        }

        let text = |i: usize| {
            record
                .get(i)
                .and_then(|f| std::str::from_utf8(f).ok())
                .map(str::trim)
        };
        let int = |i: usize| text(i).and_then(|f| f.parse::<u32>().ok()).unwrap_or(0);

        Some(Self {
            timestamp: text(0).and_then(|f| NaiveDateTime::parse_from_str(f, TIMESTAMP_FORMAT).ok()),
            frac_day: text(1)?.parse().ok()?,
            heat_setpoint: int(2),
            cool_setpoint: int(3),
            outdoor_temp: int(4),
            current_temp: int(5),
            blower_rpm: int(6),
            mode: record
                .iter()
                .skip(FIELD_COUNT - 1)
                .map(String::from_utf8_lossy)
                .collect::<Vec<_>>()
                .join(","),
        })
    }

    /// Parse a single data line. Blank lines yield `None` as well.
    pub fn parse(line: &str) -> Option<Self> {
        let mut record = ByteRecord::new();
        match record_reader(line.as_bytes()).read_byte_record(&mut record) {
            Ok(true) => Self::from_record(&record),
            _ => None,
        }
    }
}
