use super::backend::{ObjectMetadata, PutOutcome, StorageBackend};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory backend for tests. Counters record which operations ran and
/// the knobs below inject failures or stale existence answers.
pub struct MemoryStorage {
    base_url: String,
    bucket: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    public_keys: Mutex<HashSet<String>>,
    pub last_metadata: Mutex<Option<ObjectMetadata>>,
    pub exists_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    pub make_public_calls: AtomicUsize,
    /// Fail every write with an injected error.
    pub fail_writes: AtomicBool,
    /// Answer `exists` with false regardless of contents, to simulate a
    /// writer racing in between the check and the write.
    pub exists_returns_false: AtomicBool,
}

impl MemoryStorage {
    pub fn new(base_url: &str, bucket: &str) -> Self {
        MemoryStorage {
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            objects: Mutex::new(HashMap::new()),
            public_keys: Mutex::new(HashSet::new()),
            last_metadata: Mutex::new(None),
            exists_calls: AtomicUsize::new(0),
            put_calls: AtomicUsize::new(0),
            make_public_calls: AtomicUsize::new(0),
            fail_writes: AtomicBool::new(false),
            exists_returns_false: AtomicBool::new(false),
        }
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn is_public(&self, key: &str) -> bool {
        self.public_keys.lock().unwrap().contains(key)
    }

    /// Total backend calls that could have touched an object.
    pub fn store_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
            + self.put_calls.load(Ordering::SeqCst)
            + self.make_public_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.exists_returns_false.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn put_if_absent(
        &self,
        key: &str,
        bytes: Bytes,
        metadata: &ObjectMetadata,
    ) -> Result<PutOutcome> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("injected write failure"));
        }

        *self.last_metadata.lock().unwrap() = Some(metadata.clone());

        match self.objects.lock().unwrap().entry(key.to_string()) {
            Entry::Occupied(_) => Ok(PutOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(bytes.to_vec());
                Ok(PutOutcome::Created)
            }
        }
    }

    async fn make_public(&self, key: &str) -> Result<()> {
        self.make_public_calls.fetch_add(1, Ordering::SeqCst);
        self.public_keys.lock().unwrap().insert(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.bucket, key)
    }

    async fn verify_connectivity(&self) -> Result<()> {
        Ok(())
    }
}
