use super::backend::{ObjectMetadata, PutOutcome, StorageBackend};
use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bytes::Bytes;

pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    /// Build the client once from configuration. Credentials and endpoint
    /// are optional so the ambient AWS environment can supply them.
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.s3_region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let (Some(access), Some(secret)) = (&config.s3_access_key, &config.s3_secret_key) {
            loader = loader
                .credentials_provider(Credentials::new(access, secret, None, None, "static"));
        }

        let sdk_config = loader.load().await;

        let client = match &config.s3_endpoint {
            Some(endpoint) => {
                // Path-style addressing for S3-compatible stores
                let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                Client::from_conf(s3_config)
            }
            None => Client::new(&sdk_config),
        };

        let base = config
            .public_base_url
            .clone()
            .or_else(|| config.s3_endpoint.clone())
            .unwrap_or_else(|| {
                let region = config.s3_region.as_deref().unwrap_or("us-east-1");
                format!("https://s3.{}.amazonaws.com", region)
            });

        Ok(S3Storage {
            client,
            bucket: config.bucket.clone(),
            public_base_url: base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn exists(&self, key: &str) -> Result<bool> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().map(|e| e.is_not_found()) == Some(true) {
                    Ok(false)
                } else {
                    Err(anyhow::anyhow!(
                        "Failed to check key {}: {}",
                        key,
                        DisplayErrorContext(&err)
                    ))
                }
            }
        }
    }

    async fn put_if_absent(
        &self,
        key: &str,
        bytes: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<PutOutcome> {
        let body = if metadata.compress {
            ByteStream::from(gzip_payload(bytes).await?)
        } else {
            ByteStream::from(bytes)
        };

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            // The write only succeeds if no object holds the key yet
            .if_none_match("*");

        if metadata.compress {
            request = request.content_encoding("gzip");
        }
        if let Some(content_type) = &metadata.content_type {
            request = request.content_type(content_type);
        }
        if let Some(cache_control) = &metadata.cache_control {
            request = request.cache_control(cache_control);
        }

        match request.send().await {
            Ok(_) => Ok(PutOutcome::Created),
            Err(err) => match err.code() {
                Some("PreconditionFailed") | Some("ConditionalRequestConflict") => {
                    Ok(PutOutcome::AlreadyExists)
                }
                _ => Err(anyhow::anyhow!(
                    "Failed to write key {}: {}",
                    key,
                    DisplayErrorContext(&err)
                )),
            },
        }
    }

    async fn make_public(&self, key: &str) -> Result<()> {
        self.client
            .put_object_acl()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|err| {
                anyhow::anyhow!(
                    "Failed to set public ACL on key {}: {}",
                    key,
                    DisplayErrorContext(&err)
                )
            })?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }

    async fn verify_connectivity(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|err| {
                anyhow::anyhow!(
                    "Cannot reach bucket {}: {}",
                    self.bucket,
                    DisplayErrorContext(&err)
                )
            })?;

        Ok(())
    }
}

/// Gzip the payload off the async runtime.
async fn gzip_payload(bytes: Bytes) -> Result<Vec<u8>> {
    let compressed = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder =
            GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
        encoder.write_all(&bytes)?;
        encoder.finish()
    })
    .await??;

    Ok(compressed)
}
