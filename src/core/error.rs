use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::StorageError;
use crate::labels::LabelError;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Missing/blank required field, non-positive or non-numeric quantity
    #[error("{0}")]
    InvalidInput(String),

    /// Durable read/write failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// QR rendering or PNG encoding failure
    #[error("Label rendering error: {0}")]
    Label(#[from] LabelError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error body shape expected by the frontend: `{"error": "..."}`
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServerError::Storage(err) => {
                tracing::error!(error = ?err, "Storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Label(err) => {
                tracing::error!(error = ?err, "Label rendering failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServerError::Internal(err) => {
                tracing::error!(error = ?err, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result alias used by handlers
pub type Result<T> = std::result::Result<T, ServerError>;
