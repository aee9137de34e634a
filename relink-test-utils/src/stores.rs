//! Object-store doubles

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relink_store::{MemoryObjectStore, ObjectStore, PutObject, Result, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One completed call against a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `put_object` finished
    Put {
        /// Bucket written to
        bucket: String,
        /// Key written
        key: String,
        /// Body as UTF-8 (lossy)
        body: String,
        /// Declared content type
        content_type: String,
    },
    /// `presigned_url` was requested
    Link {
        /// Bucket of the object
        bucket: String,
        /// Key of the object
        key: String,
        /// Requested expiry
        expires_at: DateTime<Utc>,
    },
}

/// Memory store that logs every call and tracks concurrent writes.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryObjectStore,
    calls: Mutex<Vec<StoreCall>>,
    put_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingStore {
    /// Store that completes writes immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that holds every write for `delay` before completing it
    pub fn with_put_delay(delay: Duration) -> Self {
        Self {
            put_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Calls in completion order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Keys of every completed write, in completion order
    pub fn put_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Put { key, .. } => Some(key),
                StoreCall::Link { .. } => None,
            })
            .collect()
    }

    /// Highest number of writes observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Underlying memory store
    pub fn inner(&self) -> &MemoryObjectStore {
        &self.inner
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put_object(&self, request: PutObject) -> Result<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }

        let call = StoreCall::Put {
            bucket: request.bucket.clone(),
            key: request.key.clone(),
            body: String::from_utf8_lossy(&request.body).into_owned(),
            content_type: request.content_type.clone(),
        };
        let result = self.inner.put_object(request).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result?;
        self.calls.lock().unwrap().push(call);
        Ok(())
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(StoreCall::Link {
            bucket: bucket.to_string(),
            key: key.to_string(),
            expires_at,
        });
        self.inner.presigned_url(bucket, key, expires_at).await
    }
}

/// Memory store that fails on demand.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryObjectStore,
    fail_put_at: Option<usize>,
    fail_body: Option<Vec<u8>>,
    fail_links: bool,
    put_delay: Option<Duration>,
    puts: AtomicUsize,
    completed: AtomicUsize,
}

impl FailingStore {
    /// Fail the write with zero-based sequence number `n`; other writes succeed
    pub fn on_put(n: usize) -> Self {
        Self {
            fail_put_at: Some(n),
            ..Self::default()
        }
    }

    /// Fail at once every write whose body equals `body`
    pub fn on_body(body: &str) -> Self {
        Self {
            fail_body: Some(body.as_bytes().to_vec()),
            ..Self::default()
        }
    }

    /// Hold every write that is not failed for `delay` before completing it
    pub fn with_put_delay(mut self, delay: Duration) -> Self {
        self.put_delay = Some(delay);
        self
    }

    /// Accept every write but fail every link request
    pub fn on_link() -> Self {
        Self {
            fail_links: true,
            ..Self::default()
        }
    }

    /// Number of write attempts seen, including the failed one
    pub fn put_attempts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of writes that ran to completion
    pub fn completed_puts(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Underlying memory store
    pub fn inner(&self) -> &MemoryObjectStore {
        &self.inner
    }
}

#[async_trait]
impl ObjectStore for FailingStore {
    async fn put_object(&self, request: PutObject) -> Result<()> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst);
        let body_matches = self
            .fail_body
            .as_deref()
            .is_some_and(|body| body == &request.body[..]);
        if self.fail_put_at == Some(n) || body_matches {
            return Err(StoreError::Unavailable(format!(
                "injected failure writing {}",
                request.key
            )));
        }
        if let Some(delay) = self.put_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.put_object(request).await?;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String> {
        if self.fail_links {
            return Err(StoreError::Unavailable(format!(
                "injected failure linking {bucket}/{key}"
            )));
        }
        self.inner.presigned_url(bucket, key, expires_at).await
    }
}
