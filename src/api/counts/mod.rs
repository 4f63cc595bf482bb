//! Counter query API.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/get_current_count", get(handler::get_current_count))
        .route("/get_year_count/{year}", get(handler::get_year_count))
}
