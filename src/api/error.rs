use crate::services::storage::StorageError;
use crate::services::transfer::TransferError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        /// Byte count the server holds, so the client can resume from it.
        offset: Option<u64>,
    },

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        let message = err.to_string();
        match err {
            TransferError::PathResolution { .. } => {
                tracing::warn!("Rejected client path: {}", message);
                AppError::BadRequest(message)
            }
            // The client stopped sending; what arrived is kept for the next attempt.
            TransferError::SourceIo { .. } => AppError::BadRequest(message),
            TransferError::SizeMismatch { current, .. } => AppError::Conflict {
                message,
                offset: Some(current),
            },
            TransferError::OffsetMismatch { expected, .. } => AppError::Conflict {
                message,
                offset: Some(expected),
            },
            TransferError::Incomplete { persisted, .. } => AppError::Conflict {
                message,
                offset: Some(persisted),
            },
            TransferError::TooLarge { .. } => AppError::PayloadTooLarge(message),
            TransferError::ArtifactIo { .. } => AppError::Internal(message),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Path(e) => e.into(),
            StorageError::NotFound(name) => AppError::NotFound(format!("File not found: {name}")),
            StorageError::NotAFile(name) => {
                AppError::BadRequest(format!("Not a regular file: {name}"))
            }
            StorageError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, offset) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Conflict { message, offset } => (StatusCode::CONFLICT, message, offset),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg, None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let body = match offset {
            Some(offset) => json!({ "error": message, "offset": offset }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
