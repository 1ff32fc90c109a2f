use crate::export::CSV_FILE_NAME;
use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(&format!("/{CSV_FILE_NAME}"), get(handlers::download_csv))
        .route("/api/metrics", get(handlers::get_metrics))
        .with_state(state)
}
