use super::backend::{ObjectMetadata, PutOutcome, StorageBackend};
use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Filesystem backend, mainly for development and tests. Objects land
/// under `<root>/<bucket>/<key>` and are expected to be served by an
/// external file server. The compression hint is ignored.
pub struct LocalStorage {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(config: &Config) -> Result<Self> {
        let root = config
            .local_storage_path
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("LOCAL_STORAGE_PATH must be set for local storage"))?;

        let base = config
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", config.server_port));

        Ok(LocalStorage {
            root: PathBuf::from(root),
            bucket: config.bucket.clone(),
            public_base_url: base.trim_end_matches('/').to_string(),
        })
    }

    /// Map a key to its on-disk path. Keys must stay inside the storage root.
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        if key.contains('/') || key.contains('\\') || key == ".." {
            return Err(anyhow::anyhow!("Invalid storage key: {}", key));
        }
        Ok(self.root.join(&self.bucket).join(key))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn put_if_absent(
        &self,
        key: &str,
        bytes: Bytes,
        _metadata: &ObjectMetadata,
    ) -> Result<PutOutcome> {
        let path = self.object_path(key)?;
        tokio::fs::create_dir_all(self.root.join(&self.bucket)).await?;

        // create_new makes the claim atomic on the filesystem
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Ok(PutOutcome::AlreadyExists);
            }
            Err(err) => {
                return Err(anyhow::anyhow!(
                    "Failed to create {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        // Flush errors count as write failures: tokio files buffer
        // internally, so a disk error can first surface at flush.
        if let Err(err) = write_fully(&mut file, &bytes).await {
            // Drop the partial object so the key stays claimable
            let _ = tokio::fs::remove_file(&path).await;
            return Err(anyhow::anyhow!(
                "Failed to write {}: {}",
                path.display(),
                err
            ));
        }

        Ok(PutOutcome::Created)
    }

    async fn make_public(&self, _key: &str) -> Result<()> {
        // Everything under the storage root is already world-readable
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }

    async fn verify_connectivity(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.root.join(&self.bucket)).await?;
        Ok(())
    }
}

async fn write_fully<W>(sink: &mut W, bytes: &[u8]) -> std::io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    sink.write_all(bytes).await?;
    sink.flush().await
}
