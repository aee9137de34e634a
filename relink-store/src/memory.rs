//! In-process object store

use crate::error::{Result, StoreError};
use crate::{validate_name, ObjectStore, PutObject};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// Object held by a [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object body
    pub body: Bytes,
    /// Content type declared on write
    pub content_type: String,
}

/// Object store that keeps everything in memory.
///
/// Links have the form `memory://<bucket>/<key>?expires=<unix-seconds>`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored object.
    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects across all buckets.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Keys stored in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Total bytes stored across all buckets.
    pub fn total_bytes(&self) -> usize {
        self.lock().values().map(|obj| obj.body.len()).sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), StoredObject>> {
        // Entries are inserted whole, so a poisoned map is still consistent.
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, request: PutObject) -> Result<()> {
        validate_name(&request.bucket, StoreError::InvalidBucket)?;
        validate_name(&request.key, StoreError::InvalidKey)?;

        trace!(bucket = %request.bucket, key = %request.key, "memory put");
        self.lock().insert(
            (request.bucket, request.key),
            StoredObject {
                body: request.body,
                content_type: request.content_type,
            },
        );
        Ok(())
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String> {
        if self.get(bucket, key).is_none() {
            return Err(StoreError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        Ok(format!(
            "memory://{}/{}?expires={}",
            bucket,
            key,
            expires_at.timestamp()
        ))
    }
}
