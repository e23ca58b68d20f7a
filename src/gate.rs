use crate::config::Config;
use crate::error::AdmissionError;
use crate::storage::{ObjectMetadata, PutOutcome, StorageBackend};
use bytes::Bytes;
use std::sync::Arc;

/// Outcome of an admitted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub public_url: String,
    pub key: String,
}

/// Validates a submission and drives it through the storage backend.
///
/// Admission order: name checks, size checks, collision check, conditional
/// write, public ACL. The first failing step wins and nothing later runs.
#[derive(Clone)]
pub struct UploadGate {
    storage: Arc<dyn StorageBackend>,
    max_upload_bytes: u64,
    cache_max_age_seconds: u64,
}

impl UploadGate {
    pub fn new(storage: Arc<dyn StorageBackend>, config: &Config) -> Self {
        UploadGate {
            storage,
            max_upload_bytes: config.max_upload_bytes,
            cache_max_age_seconds: config.cache_max_age_seconds,
        }
    }

    pub async fn admit(
        &self,
        raw_file_name: &str,
        content_type: Option<&str>,
        payload: Bytes,
        declared_size: u64,
    ) -> Result<UploadResult, AdmissionError> {
        let key = normalize_key(raw_file_name)?;

        let actual = payload.len() as u64;
        if declared_size != actual {
            return Err(AdmissionError::SizeMismatch {
                declared: declared_size,
                actual,
            });
        }
        if declared_size == 0 {
            return Err(AdmissionError::EmptyFile);
        }
        if declared_size > self.max_upload_bytes {
            return Err(AdmissionError::SizeExceeded {
                size: declared_size,
                limit: self.max_upload_bytes,
            });
        }

        // Cheap early reject; the conditional write below is the
        // authoritative guard against concurrent claims.
        let taken = self
            .storage
            .exists(&key)
            .await
            .map_err(AdmissionError::StorageWriteFailed)?;
        if taken {
            return Err(AdmissionError::Conflict { key });
        }

        let metadata = ObjectMetadata {
            content_type: content_type.map(str::to_string),
            cache_control: Some(format!("public, max-age={}", self.cache_max_age_seconds)),
            compress: true,
        };

        match self.storage.put_if_absent(&key, payload, &metadata).await {
            Ok(PutOutcome::Created) => {}
            Ok(PutOutcome::AlreadyExists) => return Err(AdmissionError::Conflict { key }),
            Err(err) => return Err(AdmissionError::StorageWriteFailed(err)),
        }

        self.storage
            .make_public(&key)
            .await
            .map_err(AdmissionError::StorageWriteFailed)?;

        Ok(UploadResult {
            public_url: self.storage.public_url(&key),
            key,
        })
    }
}

/// Lowercase the submitted name into its storage key. Empty names and
/// whitespace anywhere in the name are rejected.
fn normalize_key(raw: &str) -> Result<String, AdmissionError> {
    if raw.is_empty() {
        return Err(AdmissionError::InvalidName(
            "File name must not be empty".to_string(),
        ));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(AdmissionError::InvalidName(
            "File name must not contain whitespace".to_string(),
        ));
    }
    Ok(raw.to_lowercase())
}
