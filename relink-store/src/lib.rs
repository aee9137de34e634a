//! Relink Store - Object-store contract and built-in stores
//!
//! The transformer only needs two things from an object store: persist a
//! byte blob under a key, then hand out a time-bounded link to it. This
//! crate defines that contract and the publish-and-link routine built on
//! it:
//!
//! - [`ObjectStore`] trait
//! - Collision-resistant object key generation
//! - Link expiry computation
//! - [`MemoryObjectStore`] for tests and dry runs
//! - [`FsObjectStore`] backed by a local directory

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod expiry;
pub mod fs;
pub mod memory;

pub use error::{Result, StoreError};
pub use expiry::LinkExpiry;
pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Object write request.
#[derive(Debug, Clone)]
pub struct PutObject {
    /// Destination bucket
    pub bucket: String,
    /// Destination key, unique within the bucket
    pub key: String,
    /// Object body
    pub body: Bytes,
    /// Declared content type
    pub content_type: String,
}

/// Storage backend the transformer publishes field content to.
///
/// Implementations must be safe to call concurrently; the transformer keeps
/// two requests in flight per record.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Durably persist an object. Returns once the write is acknowledged.
    async fn put_object(&self, request: PutObject) -> Result<()>;

    /// Produce a shareable link to a stored object, valid until `expires_at`.
    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String>;
}

/// Generate a fresh object key: a random UUID rendered as 32 lowercase hex
/// characters with no separators.
pub fn generate_object_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Outcome of publishing one field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedLink {
    /// Key the value was stored under
    pub key: String,
    /// Link handed back to the caller
    pub url: String,
    /// Number of bytes stored
    pub bytes: usize,
}

/// Parameters shared by every publish in one transformation.
#[derive(Debug, Clone, Copy)]
pub struct PublishTarget<'a> {
    /// Bucket objects are written to
    pub bucket: &'a str,
    /// Content type declared on every object
    pub content_type: &'a str,
    /// Expiry instant requested for every link
    pub expires_at: DateTime<Utc>,
}

/// Store `value` under a freshly generated key, then request its link.
///
/// A `None` value is stored as an empty object. The link is only requested
/// after the write has been acknowledged; there is no retry.
pub async fn publish_and_link(
    store: &dyn ObjectStore,
    target: PublishTarget<'_>,
    value: Option<&str>,
) -> Result<PublishedLink> {
    let key = generate_object_key();
    let body = Bytes::copy_from_slice(value.unwrap_or_default().as_bytes());
    let bytes = body.len();

    store
        .put_object(PutObject {
            bucket: target.bucket.to_string(),
            key: key.clone(),
            body,
            content_type: target.content_type.to_string(),
        })
        .await?;

    let url = store
        .presigned_url(target.bucket, &key, target.expires_at)
        .await?;

    debug!(bucket = %target.bucket, key = %key, bytes, "published object");

    Ok(PublishedLink { key, url, bytes })
}

pub(crate) fn validate_name(name: &str, kind: fn(String) -> StoreError) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(kind(name.to_string()))
    }
}
