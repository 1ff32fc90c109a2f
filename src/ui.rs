use crate::chart::render_daily_chart;
use crate::export::CSV_FILE_NAME;
use crate::models::{ContactTable, Dashboard, REQUEST_TIME, format_cell, format_value};
use askama::Template;
use std::time::Duration;

pub const RECENT_LIMIT: usize = 10;

const PREVIEW_COLUMNS: [&str; 3] = ["name", "email", REQUEST_TIME];
const HIDDEN_DETAIL_FIELD: &str = "id";

/// The whole page. Every interpolated value is HTML-escaped by the template
/// except `chart`, which is markup built by `render_daily_chart`.
#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardPage<'a> {
    error: Option<&'a str>,
    kpis: [Kpi; 3],
    chart: Option<String>,
    recent: Vec<RecentMessage>,
    recent_rows: Option<DataTable>,
    all_rows: Option<DataTable>,
    csv_file: &'static str,
    refresh_secs: u64,
}

struct Kpi {
    label: &'static str,
    value: u64,
}

struct RecentMessage {
    name: String,
    email: String,
    details: Vec<(String, String)>,
}

/// Rendered through `templates/data_table.html`.
struct DataTable {
    class: &'static str,
    columns: Vec<String>,
    cells: Vec<Vec<String>>,
}

pub fn render_dashboard(
    dashboard: &Dashboard,
    refresh_every: Duration,
) -> Result<String, askama::Error> {
    let table = &dashboard.table;
    let has_preview = PREVIEW_COLUMNS.iter().any(|column| table.has_column(column));

    let chart = if table.is_empty() || !table.has_request_time() {
        None
    } else {
        render_daily_chart(&dashboard.daily)
    };

    let (recent, recent_rows) = if table.is_empty() {
        (Vec::new(), None)
    } else if has_preview {
        (recent_messages(table), None)
    } else {
        (Vec::new(), Some(data_table(table, RECENT_LIMIT, false)))
    };

    DashboardPage {
        error: dashboard.error.as_deref(),
        kpis: [
            Kpi {
                label: "📨 Total messages",
                value: dashboard.metrics.total,
            },
            Kpi {
                label: "📅 Today",
                value: dashboard.metrics.today,
            },
            Kpi {
                label: "📈 Last 7 days",
                value: dashboard.metrics.last_7_days,
            },
        ],
        chart,
        recent,
        recent_rows,
        all_rows: (!table.is_empty()).then(|| data_table(table, table.len(), true)),
        csv_file: CSV_FILE_NAME,
        refresh_secs: refresh_every.as_secs(),
    }
    .render()
}

/// Newest messages first, capped at `RECENT_LIMIT`. `table` must already be
/// sorted.
fn recent_messages(table: &ContactTable) -> Vec<RecentMessage> {
    table
        .rows()
        .iter()
        .take(RECENT_LIMIT)
        .map(|row| RecentMessage {
            name: table
                .value(row, "name")
                .map(format_value)
                .unwrap_or_else(|| "Unknown".to_string()),
            email: format_cell(table.value(row, "email")),
            details: table
                .columns()
                .iter()
                .zip(&row.values)
                .filter(|(column, _)| column.as_str() != HIDDEN_DETAIL_FIELD)
                .map(|(column, cell)| (humanize_label(column), format_cell(cell.as_ref())))
                .collect(),
        })
        .collect()
}

fn data_table(table: &ContactTable, limit: usize, sortable: bool) -> DataTable {
    DataTable {
        class: if sortable { "data sortable" } else { "data" },
        columns: table.columns().to_vec(),
        cells: table
            .rows()
            .iter()
            .take(limit)
            .map(|row| row.values.iter().map(|cell| format_cell(cell.as_ref())).collect())
            .collect(),
    }
}

/// Field name as a label: underscores become spaces and each word is
/// title-cased ("request_time" -> "Request Time").
pub fn humanize_label(field: &str) -> String {
    let mut label = String::with_capacity(field.len());
    let mut previous_cased = false;
    for ch in field.chars().map(|ch| if ch == '_' { ' ' } else { ch }) {
        if ch.is_alphabetic() {
            if previous_cased {
                label.extend(ch.to_lowercase());
            } else {
                label.extend(ch.to_uppercase());
            }
            previous_cased = true;
        } else {
            label.push(ch);
            previous_cased = false;
        }
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoadOutcome;
    use crate::stats::build_dashboard_at;
    use crate::storage::normalize;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    const REFRESH: Duration = Duration::from_secs(60);

    fn dashboard(rows: Value) -> Dashboard {
        let records = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item.as_object().cloned().unwrap())
            .collect();
        let outcome = LoadOutcome {
            table: normalize(records).unwrap(),
            error: None,
        };
        build_dashboard_at(Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap(), &outcome)
    }

    fn render(dashboard: &Dashboard) -> String {
        render_dashboard(dashboard, REFRESH).unwrap()
    }

    fn summaries(html: &str) -> Vec<String> {
        html.split("<summary>")
            .skip(1)
            .map(|part| part.split("</summary>").next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn empty_dashboard_shows_messages_instead_of_widgets() {
        let html = render(&build_dashboard_at(Utc::now(), &LoadOutcome::default()));

        assert!(html.contains("No contact message data available"));
        assert!(html.contains("No messages yet"));
        assert!(html.contains("No contact messages yet"));
        assert!(!html.contains("<svg"));
        assert!(!html.contains("<table"));
        assert!(!html.contains("Download as CSV"));
        assert!(html.contains("Data refreshes every 60 seconds"));
    }

    #[test]
    fn kpis_render_in_fixed_order() {
        let html = render(&dashboard(json!([{"id": 1, "created_at": "2024-01-10T08:00:00Z"}])));
        let total = html.find("Total messages").unwrap();
        let today = html.find("📅 Today").unwrap();
        let week = html.find("Last 7 days").unwrap();
        assert!(total < today && today < week);
    }

    #[test]
    fn recent_activity_is_newest_first_and_capped() {
        let rows: Vec<Value> = (1..=12)
            .map(|day| {
                json!({
                    "id": day,
                    "name": format!("Sender {day}"),
                    "email": format!("s{day}@example.com"),
                    "created_at": format!("2024-01-{day:02}T09:00:00Z"),
                })
            })
            .collect();
        let html = render(&dashboard(Value::Array(rows)));

        let labels = summaries(&html);
        assert_eq!(labels.len(), RECENT_LIMIT);
        assert_eq!(labels[0], "📨 Sender 12 - s12@example.com");
        assert_eq!(labels[9], "📨 Sender 3 - s3@example.com");
    }

    #[test]
    fn recent_activity_orders_by_request_time() {
        let html = render(&dashboard(json!([
            {"name": "three", "created_at": "2024-01-03T00:00:00Z"},
            {"name": "one", "created_at": "2024-01-01T00:00:00Z"},
            {"name": "two", "created_at": "2024-01-02T00:00:00Z"}
        ])));
        assert_eq!(
            summaries(&html),
            vec!["📨 three - ", "📨 two - ", "📨 one - "]
        );
    }

    #[test]
    fn details_hide_id_and_humanize_labels() {
        let html = render(&dashboard(json!([{
            "id": 42,
            "email": "ada@example.com",
            "company_name": "Analytical <Engines>",
            "created_at": "2024-01-09T00:00:00Z"
        }])));

        assert_eq!(summaries(&html), vec!["📨 Unknown - ada@example.com"]);
        assert!(html.contains("<strong>Company Name:</strong> Analytical &lt;Engines&gt;"));
        assert!(html.contains("<strong>Request Time:</strong> 2024-01-09 00:00:00+00:00"));
        assert!(!html.contains("<strong>Id:</strong>"));
    }

    #[test]
    fn unnamed_sender_is_unknown_even_when_other_rows_have_names() {
        let html = render(&dashboard(json!([
            {"name": "Ada", "email": "a@x.io", "created_at": "2024-01-08T00:00:00Z"},
            {"email": "b@x.io", "created_at": "2024-01-09T00:00:00Z"},
            {"name": null, "email": "c@x.io", "created_at": "2024-01-07T00:00:00Z"}
        ])));

        assert_eq!(
            summaries(&html),
            vec!["📨 Unknown - b@x.io", "📨 Ada - a@x.io", "📨  - c@x.io"]
        );
    }

    #[test]
    fn field_values_are_escaped_everywhere() {
        let html = render(&dashboard(json!([{
            "name": "<script>alert(1)</script>",
            "email": "x@y.io",
            "created_at": "2024-01-09T00:00:00Z"
        }])));

        assert!(!html.contains("<script>alert(1)"));
        assert!(summaries(&html)[0].starts_with("📨 &lt;script&gt;alert(1)"));
        assert!(html.contains("<td>&lt;script&gt;alert(1)"));
    }

    #[test]
    fn missing_time_column_keeps_tables_and_hides_chart() {
        let html = render(&dashboard(json!([
            {"id": 1, "name": "first"},
            {"id": 2, "name": "second"}
        ])));

        assert!(html.contains("No contact message data available"));
        assert_eq!(summaries(&html), vec!["📨 first - ", "📨 second - "]);
        assert!(html.contains("<td>1</td><td>first</td>"));
        assert!(html.contains("Download as CSV"));
    }

    #[test]
    fn preview_falls_back_to_plain_rows() {
        let html = render(&dashboard(json!([{"id": 1, "message": "hello"}])));
        assert!(summaries(&html).is_empty());
        assert_eq!(html.matches("<td>hello</td>").count(), 2);
    }

    #[test]
    fn load_error_is_shown() {
        let outcome = LoadOutcome {
            table: ContactTable::default(),
            error: Some("Error loading contact messages: timed out".to_string()),
        };
        let html = render(&build_dashboard_at(Utc::now(), &outcome));
        assert!(html.contains(r#"role="alert">Error loading contact messages: timed out"#));
    }

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(humanize_label("request_time"), "Request Time");
        assert_eq!(humanize_label("EMAIL"), "Email");
        assert_eq!(humanize_label("utm_source2x"), "Utm Source2X");
    }
}
