//! Counter query handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::core::{Result, ServerState};

#[derive(Debug, Serialize)]
pub struct CurrentCountResponse {
    pub total_count: u64,
    /// BTreeMap keeps year keys in lexical order in the JSON output
    pub year_counts: BTreeMap<String, u64>,
    pub next_serial: u64,
}

#[derive(Debug, Serialize)]
pub struct YearCountResponse {
    pub year: String,
    pub count: u64,
    pub next_serial: u64,
}

/// GET /get_current_count
///
/// `next_serial` here is `total_count + 1` — total batches, not a
/// per-year serial. Historical contract, preserved.
pub async fn get_current_count(
    State(state): State<ServerState>,
) -> Result<Json<CurrentCountResponse>> {
    let total_count = state.store.get_total_count()?;
    let year_counts = state.store.get_all_year_counts()?;

    Ok(Json(CurrentCountResponse {
        total_count,
        year_counts,
        next_serial: total_count + 1,
    }))
}

/// GET /get_year_count/{year}
pub async fn get_year_count(
    State(state): State<ServerState>,
    Path(year): Path<String>,
) -> Result<Json<YearCountResponse>> {
    let count = state.store.get_year_count(&year)?;

    Ok(Json(YearCountResponse {
        year,
        count,
        next_serial: count + 1,
    }))
}
