use serde::Deserialize;
use std::env;

/// Default payload cap: 70 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 70 * 1024 * 1024;

/// Default Cache-Control max-age on stored objects: one year.
pub const DEFAULT_CACHE_MAX_AGE_SECONDS: u64 = 31_536_000;

/// Hard ceiling on the configurable payload cap: 1 GiB. Payloads are
/// buffered in memory and the cap feeds the HTTP body limit, which must
/// fit a `usize` on 32-bit hosts.
pub const MAX_UPLOAD_BYTES_CEILING: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub storage_type: StorageType,
    pub bucket: String,
    pub max_upload_bytes: u64,
    pub cache_max_age_seconds: u64,
    pub public_base_url: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub local_storage_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub enum StorageType {
    S3,
    Local,
}

impl std::str::FromStr for StorageType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageType::S3),
            "local" => Ok(StorageType::Local),
            _ => Err(anyhow::anyhow!("Invalid storage type: {}", s)),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8001".to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid SERVER_PORT: {}", e))?,
            storage_type: env::var("STORAGE_TYPE")
                .unwrap_or_else(|_| "s3".to_string())
                .parse()?,
            bucket: env::var("UPLOAD_BUCKET")
                .map_err(|_| anyhow::anyhow!("UPLOAD_BUCKET must be set"))?,
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid MAX_UPLOAD_BYTES: {}", e))?,
            cache_max_age_seconds: env::var("CACHE_MAX_AGE_SECONDS")
                .unwrap_or_else(|_| DEFAULT_CACHE_MAX_AGE_SECONDS.to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid CACHE_MAX_AGE_SECONDS: {}", e))?,
            public_base_url: env::var("PUBLIC_BASE_URL").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_access_key: env::var("S3_ACCESS_KEY").ok(),
            s3_secret_key: env::var("S3_SECRET_KEY").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_BUCKET must not be empty"));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_BYTES must be greater than zero"));
        }
        if self.max_upload_bytes > MAX_UPLOAD_BYTES_CEILING {
            return Err(anyhow::anyhow!(
                "MAX_UPLOAD_BYTES must not exceed {} bytes",
                MAX_UPLOAD_BYTES_CEILING
            ));
        }
        if self.storage_type == StorageType::Local && self.local_storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH must be set for local storage"
            ));
        }
        Ok(())
    }
}
