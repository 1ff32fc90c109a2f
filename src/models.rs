use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Canonical name of the detected time column.
pub const REQUEST_TIME: &str = "request_time";

/// One contact-form submission. `values` is aligned with the owning table's
/// columns; `None` marks a field the record did not have. `request_time` is
/// the parsed canonical time, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    pub values: Vec<Option<Value>>,
    pub request_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactTable {
    columns: Vec<String>,
    rows: Vec<ContactMessage>,
    time_column: Option<usize>,
}

impl ContactTable {
    pub fn new(columns: Vec<String>, rows: Vec<ContactMessage>, time_column: Option<usize>) -> Self {
        Self {
            columns,
            rows,
            time_column,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ContactMessage] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_request_time(&self) -> bool {
        self.time_column.is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Field `name` of `row`, or `None` when the table has no such column or
    /// the record lacked the field.
    pub fn value<'a>(&self, row: &'a ContactMessage, name: &str) -> Option<&'a Value> {
        self.column_index(name)
            .and_then(|index| row.values.get(index))
            .and_then(Option::as_ref)
    }

    /// Copy of the table ordered by `request_time`, newest first. Rows without
    /// a time go last; ties keep source order. Without a time column the copy
    /// keeps source order.
    pub fn sorted_newest_first(&self) -> ContactTable {
        let mut sorted = self.clone();
        if sorted.has_request_time() {
            sorted
                .rows
                .sort_by(|a, b| match (a.request_time, b.request_time) {
                    (Some(a), Some(b)) => b.cmp(&a),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                });
        }
        sorted
    }
}

/// Result of one load. A failed load carries an empty table and the message
/// shown to the user.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub table: ContactTable,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Metrics {
    pub total: u64,
    pub today: u64,
    pub last_7_days: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub metrics: Metrics,
    pub daily: Vec<DailyCount>,
    pub table: ContactTable,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub total: u64,
    pub today: u64,
    pub last_7_days: u64,
    pub daily: Vec<DailyPoint>,
    pub error: Option<String>,
}

impl From<&Dashboard> for MetricsResponse {
    fn from(dashboard: &Dashboard) -> Self {
        Self {
            total: dashboard.metrics.total,
            today: dashboard.metrics.today,
            last_7_days: dashboard.metrics.last_7_days,
            daily: dashboard
                .daily
                .iter()
                .map(|day| DailyPoint {
                    date: day.date.to_string(),
                    count: day.count,
                })
                .collect(),
            error: dashboard.error.clone(),
        }
    }
}

/// Text form of a cell, shared by the page and the CSV export.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        nested => nested.to_string(),
    }
}

/// Like `format_value`, with an absent field rendered empty.
pub fn format_cell(cell: Option<&Value>) -> String {
    cell.map(format_value).unwrap_or_default()
}
