use std::cmp::Ordering;

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike,
};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{BackfillError, Result};
use crate::pivot::WideTable;
use crate::readings::DeviceKey;

static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an ISO-8601 calendar date-time of any seconds precision, or a bare date.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(BackfillError::TimestampParse {
        value: trimmed.to_string(),
    })
}

/// Why a wall-clock time has no single instant in the target zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidLocalTime {
    /// Falls in the repeated hour at the end of daylight saving time.
    Ambiguous,
    /// Falls in the skipped hour at the start of daylight saving time.
    Nonexistent,
}

pub fn localize(
    naive: NaiveDateTime,
    tz: Tz,
) -> std::result::Result<DateTime<Tz>, InvalidLocalTime> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(_, _) => Err(InvalidLocalTime::Ambiguous),
        LocalResult::None => Err(InvalidLocalTime::Nonexistent),
    }
}

/// Parses, localizes into `tz`, then shifts by `shift` of elapsed time.
///
/// Ambiguous and nonexistent wall-clock times become `None`. Any unparsable value fails
/// the whole sequence.
pub fn normalize_timestamps<S: AsRef<str>>(
    raw: &[S],
    tz: Tz,
    shift: Duration,
) -> Result<Vec<Option<DateTime<Tz>>>> {
    raw.iter()
        .map(|value| {
            let text: &str = value.as_ref();
            let naive = parse_timestamp(text)?;
            Ok(match localize(naive, tz) {
                Ok(local) => Some(local + shift),
                Err(reason) => {
                    debug!(timestamp = text, ?reason, "timestamp has no single local instant");
                    None
                }
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub raw_timestamp: String,
    /// `None` marks an ambiguous or nonexistent local time.
    pub timestamp: Option<DateTime<Tz>>,
    pub cells: Vec<Option<f64>>,
}

/// A wide table whose timestamp column has been localized and shifted.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub key: DeviceKey,
    pub columns: Vec<String>,
    pub rows: Vec<NormalizedRow>,
}

impl NormalizedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.rows.iter().filter(|row| row.timestamp.is_none()).count()
    }

    /// Calendar dates, in the local zone, of the earliest and latest valid timestamps.
    pub fn date_range(&self) -> Option<DateRange> {
        let mut valid = self.rows.iter().filter_map(|row| row.timestamp.as_ref());
        let first = valid.next()?;
        let (min, max) = valid.fold((first, first), |(min, max), ts| {
            (if ts < min { ts } else { min }, if ts > max { ts } else { max })
        });
        Some(DateRange {
            start: min.date_naive(),
            end: max.date_naive(),
        })
    }

    /// Formats the timestamp column; sub-second digits appear only if some row needs them.
    pub fn rendered_timestamps(&self) -> Vec<String> {
        let fractional = self
            .rows
            .iter()
            .filter_map(|row| row.timestamp.as_ref())
            .any(|ts| ts.nanosecond() != 0);
        let fmt = if fractional {
            "%Y-%m-%d %H:%M:%S%.6f%:z"
        } else {
            "%Y-%m-%d %H:%M:%S%:z"
        };

        self.rows
            .iter()
            .map(|row| {
                row.timestamp
                    .as_ref()
                    .map(|ts| ts.format(fmt).to_string())
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Localizes and shifts every row, then orders rows by instant.
///
/// Rows whose local time is ambiguous or nonexistent are kept, sorted after every valid row
/// in raw-text order, and take no part in the date range.
pub fn normalize_table(table: WideTable, tz: Tz, shift: Duration) -> Result<NormalizedTable> {
    let raw: Vec<&str> = table.rows.iter().map(|row| row.timestamp.as_str()).collect();
    let normalized = normalize_timestamps(&raw, tz, shift)?;

    let mut rows: Vec<NormalizedRow> = table
        .rows
        .into_iter()
        .zip(normalized)
        .map(|(row, timestamp)| NormalizedRow {
            raw_timestamp: row.timestamp,
            timestamp,
            cells: row.cells,
        })
        .collect();
    rows.sort_by(compare_rows);

    Ok(NormalizedTable {
        key: table.key,
        columns: table.columns,
        rows,
    })
}

fn compare_rows(a: &NormalizedRow, b: &NormalizedRow) -> Ordering {
    match (&a.timestamp, &b.timestamp) {
        (Some(left), Some(right)) => left
            .cmp(right)
            .then_with(|| a.raw_timestamp.cmp(&b.raw_timestamp)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.raw_timestamp.cmp(&b.raw_timestamp),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_label(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_label(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }

    /// `{building}_{device}_{start}_{end}`
    pub fn folder_name(&self, key: &DeviceKey) -> String {
        format!("{key}_{}_{}", self.start_label(), self.end_label())
    }
}
