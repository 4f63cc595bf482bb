//! History handler.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::{Result, ServerState};
use crate::db::SessionRecord;

/// Older clients render at most this many rows
const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub total_count: u64,
    pub sessions: Vec<SessionRecord>,
}

/// GET /get_history
///
/// Returns the 10 most recent sessions, newest first. The truncation
/// is a backward-compatibility contract with older clients.
pub async fn get_history(State(state): State<ServerState>) -> Result<Json<HistoryResponse>> {
    let total_count = state.store.get_total_count()?;
    let sessions = state.store.list_sessions(Some(HISTORY_LIMIT), 0)?;

    Ok(Json(HistoryResponse {
        total_count,
        sessions,
    }))
}
