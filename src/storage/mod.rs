pub mod backend;
pub mod local;
#[cfg(test)]
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

pub use backend::{ObjectMetadata, PutOutcome, StorageBackend};
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

use crate::config::{Config, StorageType};
use anyhow::Result;
use std::sync::Arc;

/// Factory function to create the appropriate storage backend
pub async fn create_storage(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    match config.storage_type {
        StorageType::Local => Ok(Arc::new(LocalStorage::new(config)?)),
        #[cfg(feature = "s3")]
        StorageType::S3 => Ok(Arc::new(S3Storage::connect(config).await?)),
        #[cfg(not(feature = "s3"))]
        StorageType::S3 => Err(anyhow::anyhow!(
            "S3 support is not compiled in; rebuild with the `s3` feature"
        )),
    }
}
