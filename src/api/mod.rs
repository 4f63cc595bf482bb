//! HTTP routes and handlers.
//!
//! # Structure
//!
//! - [`labels`] - batch label generation
//! - [`counts`] - total and per-year counter queries
//! - [`history`] - recent session log
//! - [`health`] - health check (public)

pub mod counts;
pub mod health;
pub mod history;
pub mod labels;

use axum::Router;

use crate::core::ServerState;

/// Build a router with all routes registered (no middleware, no state).
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(labels::router())
        .merge(counts::router())
        .merge(history::router())
        .merge(health::router())
}
