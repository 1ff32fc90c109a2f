use crate::models::{ContactTable, DailyCount, Dashboard, LoadOutcome, Metrics};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

pub fn build_dashboard(outcome: &LoadOutcome) -> Dashboard {
    build_dashboard_at(Utc::now(), outcome)
}

pub fn build_dashboard_at(now: DateTime<Utc>, outcome: &LoadOutcome) -> Dashboard {
    Dashboard {
        metrics: compute_metrics_at(now, &outcome.table),
        daily: daily_counts(&outcome.table),
        table: outcome.table.sorted_newest_first(),
        error: outcome.error.clone(),
    }
}

pub fn compute_metrics_at(now: DateTime<Utc>, table: &ContactTable) -> Metrics {
    Metrics {
        total: table.len() as u64,
        today: count_today(now, table),
        last_7_days: count_last_7_days(now, table),
    }
}

/// Rows on the current UTC calendar day.
pub fn count_today(now: DateTime<Utc>, table: &ContactTable) -> u64 {
    let today = now.date_naive();
    table
        .rows()
        .iter()
        .filter(|row| row.request_time.is_some_and(|time| time.date_naive() == today))
        .count() as u64
}

/// Rows in the rolling 7 x 24h window ending at `now`, boundary included.
/// Not aligned to calendar days, unlike `count_today`.
pub fn count_last_7_days(now: DateTime<Utc>, table: &ContactTable) -> u64 {
    let cutoff = now - Duration::days(7);
    table
        .rows()
        .iter()
        .filter(|row| row.request_time.is_some_and(|time| time >= cutoff))
        .count() as u64
}

/// Messages per UTC date, ascending. Rows without a time are skipped.
pub fn daily_counts(table: &ContactTable) -> Vec<DailyCount> {
    let mut days: BTreeMap<_, u64> = BTreeMap::new();
    for time in table.rows().iter().filter_map(|row| row.request_time) {
        let count = days.entry(time.date_naive()).or_default();
        *count = count.saturating_add(1);
    }

    days.into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}
