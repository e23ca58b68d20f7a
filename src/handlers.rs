use crate::error::AdmissionError;
use crate::gate::UploadGate;
use crate::models::UploadResponse;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};

#[derive(Clone)]
pub struct AppState {
    pub gate: UploadGate,
}

/// POST /api/upload - Accept a single file from a multipart form
///
/// Only the `file` field is honored; unknown fields are skipped and a
/// repeated `file` field keeps the last occurrence.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AdmissionError> {
    let mut submission: Option<(String, Option<String>, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AdmissionError::InvalidMultipart(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AdmissionError::InvalidMultipart(e.to_string()))?;

                submission = Some((file_name, content_type, data));
            }
            _ => {}
        }
    }

    let (file_name, content_type, payload) = submission.ok_or(AdmissionError::MissingFile)?;

    let declared_size = payload.len() as u64;
    let result = state
        .gate
        .admit(&file_name, content_type.as_deref(), payload, declared_size)
        .await?;

    tracing::info!("Stored upload at key: {}", result.key);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            url: result.public_url,
        }),
    ))
}
