//! Batch label generation API.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/generate_qr_batch", post(handler::generate_batch))
}
