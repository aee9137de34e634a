//! Error types for object stores

use thiserror::Error;

/// Errors reported by an [`ObjectStore`](crate::ObjectStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Link requested for an object that was never stored.
    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound {
        /// Bucket that was searched
        bucket: String,
        /// Key that was requested
        key: String,
    },
    /// Bucket name cannot be used by this store.
    #[error("Invalid bucket name: '{0}'")]
    InvalidBucket(String),
    /// Object key cannot be used by this store.
    #[error("Invalid object key: '{0}'")]
    InvalidKey(String),
    /// Requested link expiry cannot be represented.
    #[error("Invalid link expiry: {0}")]
    InvalidExpiry(String),
    /// Object location cannot be expressed as a link.
    #[error("Invalid object link: {0}")]
    InvalidLink(String),
    /// Backend rejected or failed the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// I/O operation failed while writing or inspecting an object.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Object metadata could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
