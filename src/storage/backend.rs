use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Object attributes attached at write time.
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    /// Ask the backend to compress the payload before persisting it.
    pub compress: bool,
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The key was free and the object was written.
    Created,
    /// Another object already holds the key. Nothing was written.
    AlreadyExists,
}

/// Trait defining the interface for storage backends
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Check whether an object exists at the key
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Write the object only if the key is unclaimed. Existing objects are
    /// never overwritten.
    async fn put_if_absent(
        &self,
        key: &str,
        bytes: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<PutOutcome>;

    /// Make the object readable without credentials
    async fn make_public(&self, key: &str) -> Result<()>;

    /// Generate the public URL for a key
    fn public_url(&self, key: &str) -> String;

    /// Probe the backend at startup so misconfiguration fails fast
    async fn verify_connectivity(&self) -> Result<()>;
}
