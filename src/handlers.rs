use crate::errors::AppError;
use crate::export::{CSV_FILE_NAME, to_csv};
use crate::models::MetricsResponse;
use crate::state::AppState;
use crate::stats::build_dashboard;
use crate::ui::render_dashboard;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Json,
};

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let outcome = state.contact_messages().await;
    let dashboard = build_dashboard(&outcome);
    render_dashboard(&dashboard, state.refresh_every())
        .map(Html)
        .map_err(AppError::internal)
}

pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let outcome = state.contact_messages().await;
    Json(MetricsResponse::from(&build_dashboard(&outcome)))
}

pub async fn download_csv(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let outcome = state.contact_messages().await;
    let body = to_csv(&outcome.table.sorted_newest_first()).map_err(AppError::internal)?;
    let disposition = format!("attachment; filename=\"{CSV_FILE_NAME}\"");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
