use crate::models::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

/// Errors produced while admitting an upload.
///
/// Every variant translates to a structured JSON body. Backend diagnostic
/// text is exposed only for storage failures, in the `details` field.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// File name empty or containing whitespace.
    #[error("{0}")]
    InvalidName(String),

    /// Payload of zero bytes.
    #[error("File is empty")]
    EmptyFile,

    /// Payload larger than the configured cap.
    #[error("File size {size} bytes exceeds maximum allowed size of {limit} bytes")]
    SizeExceeded { size: u64, limit: u64 },

    /// Declared size disagrees with the buffered payload.
    #[error("Declared size {declared} bytes does not match received {actual} bytes")]
    SizeMismatch { declared: u64, actual: u64 },

    /// An object already exists at the derived key. Never overwritten.
    #[error("File already exists")]
    Conflict { key: String },

    /// The multipart form carried no `file` field.
    #[error("No file provided")]
    MissingFile,

    /// The multipart payload could not be read.
    #[error("Invalid multipart data: {0}")]
    InvalidMultipart(String),

    /// The backend rejected or failed the write.
    #[error("Error uploading to object storage")]
    StorageWriteFailed(anyhow::Error),
}

impl AdmissionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionError::InvalidName(_)
            | AdmissionError::EmptyFile
            | AdmissionError::SizeMismatch { .. }
            | AdmissionError::Conflict { .. }
            | AdmissionError::MissingFile
            | AdmissionError::InvalidMultipart(_) => StatusCode::BAD_REQUEST,
            AdmissionError::SizeExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AdmissionError::StorageWriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let details = match &self {
            AdmissionError::StorageWriteFailed(source) => {
                tracing::error!("Upload failed in storage backend: {:#}", source);
                Some(format!("{:#}", source))
            }
            AdmissionError::Conflict { key } => {
                tracing::debug!("Upload rejected, key already claimed: {}", key);
                None
            }
            _ => {
                tracing::debug!("Upload rejected: {}", self);
                None
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            details,
        };

        (self.status_code(), Json(body)).into_response()
    }
}
