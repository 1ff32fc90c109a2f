use crate::errors::SourceError;
use crate::models::{ContactMessage, ContactTable, LoadOutcome, REQUEST_TIME};
use crate::source::{ContactSource, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{error, info};

/// Fetches the whole table and normalizes it. Any failure degrades to an
/// empty table with the error kept for display.
pub async fn load_contact_messages(source: &dyn ContactSource, table: &str) -> LoadOutcome {
    let loaded = match source.fetch_all(table).await {
        Ok(records) => normalize(records),
        Err(err) => Err(err),
    };

    match loaded {
        Ok(contacts) => {
            info!(
                table,
                rows = contacts.len(),
                request_time = contacts.has_request_time(),
                "loaded contact messages"
            );
            LoadOutcome {
                table: contacts,
                error: None,
            }
        }
        Err(err) => {
            error!("failed to load contact messages: {err}");
            LoadOutcome {
                table: ContactTable::default(),
                error: Some(format!("Error loading contact messages: {err}")),
            }
        }
    }
}

/// Index of the first column whose name contains "created" or "time",
/// ignoring case. When several match, the first in column order wins.
pub fn find_time_column<S: AsRef<str>>(columns: &[S]) -> Option<usize> {
    columns.iter().position(|column| {
        let lower = column.as_ref().to_lowercase();
        lower.contains("created") || lower.contains("time")
    })
}

/// Column names in order of first appearance across all records.
pub fn collect_columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|column| column == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Builds the table from raw records, renaming the detected time column to
/// `request_time`. A pre-existing `request_time` column is dropped when a
/// different column takes the canonical name.
pub fn normalize(records: Vec<Record>) -> Result<ContactTable, SourceError> {
    if records.is_empty() {
        return Ok(ContactTable::default());
    }

    let source_columns = collect_columns(&records);
    let time_source = find_time_column(&source_columns);

    let kept: Vec<usize> = (0..source_columns.len())
        .filter(|&index| {
            time_source.is_none()
                || Some(index) == time_source
                || source_columns[index] != REQUEST_TIME
        })
        .collect();
    let time_column = time_source.and_then(|source| kept.iter().position(|&index| index == source));

    let columns = kept
        .iter()
        .map(|&index| {
            if Some(index) == time_source {
                REQUEST_TIME.to_string()
            } else {
                source_columns[index].clone()
            }
        })
        .collect();

    let mut rows = Vec::with_capacity(records.len());
    for mut record in records {
        let mut values = Vec::with_capacity(kept.len());
        let mut request_time = None;
        for &index in &kept {
            let value = record.remove(&source_columns[index]);
            if Some(index) == time_source {
                request_time = value.as_ref().map(parse_timestamp).transpose()?.flatten();
                // Filled in below, once the column's precision is known.
                values.push(value.map(|_| Value::Null));
            } else {
                values.push(value);
            }
        }
        rows.push(ContactMessage {
            values,
            request_time,
        });
    }

    if let Some(column) = time_column {
        let precision =
            TimestampPrecision::for_times(rows.iter().filter_map(|row| row.request_time));
        for row in &mut rows {
            if let Some(time) = row.request_time {
                row.values[column] = Some(Value::String(precision.format(time)));
            }
        }
    }

    Ok(ContactTable::new(columns, rows, time_column))
}

/// Parses a time cell as UTC. Null and blank cells are missing times; integers
/// are epoch nanoseconds; strings without an offset are taken as UTC.
pub fn parse_timestamp(value: &Value) -> Result<Option<DateTime<Utc>>, SourceError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => parse_timestamp_str(text.trim())
            .map(Some)
            .ok_or_else(|| SourceError::Timestamp(text.clone())),
        Value::Number(number) => number
            .as_i64()
            .map(|nanos| Some(DateTime::from_timestamp_nanos(nanos)))
            .ok_or_else(|| SourceError::Timestamp(number.to_string())),
        other => Err(SourceError::Timestamp(other.to_string())),
    }
}

fn parse_timestamp_str(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc));
    }

    // Postgres text output, e.g. "2024-01-02 00:30:00.123+00".
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(time) = DateTime::parse_from_str(text, format) {
            return Some(time.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(time) = NaiveDateTime::parse_from_str(text, format) {
            return Some(time.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc())
}

/// Display precision shared by every timestamp of a column: microseconds as
/// soon as one value has a fractional second, whole seconds otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPrecision {
    Seconds,
    Micros,
}

impl TimestampPrecision {
    pub fn for_times(times: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        if times
            .into_iter()
            .any(|time| time.timestamp_subsec_nanos() != 0)
        {
            Self::Micros
        } else {
            Self::Seconds
        }
    }

    pub fn format(self, time: DateTime<Utc>) -> String {
        match self {
            Self::Seconds => time.format("%Y-%m-%d %H:%M:%S+00:00").to_string(),
            Self::Micros => time.format("%Y-%m-%d %H:%M:%S%.6f+00:00").to_string(),
        }
    }
}
