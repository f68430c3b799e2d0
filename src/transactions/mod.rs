use crate::state::AppState;
use axum::Router;
use time::Date;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod stats;

// `YYYY-MM-DD`, the form date inputs submit.
time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

pub fn router() -> Router<AppState> {
    handlers::transaction_routes()
}
