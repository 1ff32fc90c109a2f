pub mod app;
pub mod cache;
pub mod chart;
pub mod config;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod source;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{find_time_column, load_contact_messages};
