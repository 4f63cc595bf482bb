//! Batch generation handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::core::{Result, ServerError, ServerState};
use crate::labels::{self, QrLabel};

/// Request body, camelCase per the frontend contract.
///
/// `quantity` is kept as a raw JSON value because clients send it both
/// as a number and as a numeric string; either parses, anything else is
/// a 400.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBatchRequest {
    #[serde(default)]
    pub part_name: String,
    #[serde(default)]
    pub vendor_name: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub quantity: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct GenerateBatchResponse {
    pub success: bool,
    pub qr_codes: Vec<QrLabel>,
    pub batch_info: BatchInfo,
}

#[derive(Debug, Serialize)]
pub struct BatchInfo {
    pub part_name: String,
    pub vendor_name: String,
    pub year: String,
    pub location: String,
    pub quantity: u32,
    pub serial_range: String,
    /// Number of batches ever generated, not labels
    pub total_generated: u64,
    pub year_count: u64,
    pub session_id: u64,
}

fn parse_quantity(value: &serde_json::Value) -> Result<i64> {
    let invalid =
        || ServerError::InvalidInput("Quantity must be a positive integer".to_string());
    match value {
        // Absent quantity defaults to a single label
        serde_json::Value::Null => Ok(1),
        serde_json::Value::Number(n) => n.as_i64().ok_or_else(invalid),
        serde_json::Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// POST /generate_qr_batch
///
/// Allocates a serial range for the year, persists the session and
/// counter atomically, then renders one QR label per serial. By the
/// time rendering runs the range is already durable, so a rendering
/// failure returns 500 without risking unrecorded serials.
pub async fn generate_batch(
    State(state): State<ServerState>,
    Json(payload): Json<GenerateBatchRequest>,
) -> Result<Json<GenerateBatchResponse>> {
    let part_name = payload.part_name.trim();
    let vendor_name = payload.vendor_name.trim();
    let year = payload.year.trim();
    let location = payload.location.trim();

    if part_name.is_empty() || vendor_name.is_empty() || year.is_empty() || location.is_empty() {
        return Err(ServerError::InvalidInput(
            "All fields are required".to_string(),
        ));
    }

    let quantity = parse_quantity(&payload.quantity)?;

    let allocation = state
        .allocator()
        .reserve(part_name, vendor_name, year, location, quantity)?;

    let mut qr_codes = Vec::with_capacity(allocation.range.len() as usize);
    for serial in allocation.range.iter() {
        qr_codes.push(labels::render_label(
            part_name,
            vendor_name,
            year,
            serial,
            location,
        )?);
    }

    let total_generated = state.store.get_total_count()?;

    Ok(Json(GenerateBatchResponse {
        success: true,
        qr_codes,
        batch_info: BatchInfo {
            part_name: part_name.to_string(),
            vendor_name: vendor_name.to_string(),
            year: year.to_string(),
            location: location.to_string(),
            quantity: allocation.range.len() as u32,
            serial_range: allocation.range.to_string(),
            total_generated,
            year_count: allocation.year_count,
            session_id: allocation.session_id,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_accepts_number_and_string() {
        assert_eq!(parse_quantity(&serde_json::json!(5)).unwrap(), 5);
        assert_eq!(parse_quantity(&serde_json::json!("3")).unwrap(), 3);
        assert_eq!(parse_quantity(&serde_json::Value::Null).unwrap(), 1);
    }

    #[test]
    fn test_parse_quantity_rejects_garbage() {
        assert!(parse_quantity(&serde_json::json!("five")).is_err());
        assert!(parse_quantity(&serde_json::json!(2.5)).is_err());
        assert!(parse_quantity(&serde_json::json!([1])).is_err());
    }
}
