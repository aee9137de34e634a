//! Error types for relink

use crate::types::LinkedField;
use thiserror::Error;

/// Boxed error produced by an object store implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reasons an envelope or one of its payloads could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The envelope itself is not valid JSON or is missing required members.
    #[error("Invalid envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    /// A record's `data` member is not valid base64.
    #[error("Record {index} ('{record_id}'): invalid base64 payload: {source}")]
    Base64 {
        /// Position of the record within the envelope.
        index: usize,
        /// Identifier of the record.
        record_id: String,
        /// Underlying base64 error.
        #[source]
        source: base64::DecodeError,
    },
    /// A record's decoded payload is not a valid log entry.
    #[error("Record {index} ('{record_id}'): invalid log entry: {source}")]
    LogEntry {
        /// Position of the record within the envelope.
        index: usize,
        /// Identifier of the record.
        record_id: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Relink error types
#[derive(Debug, Error)]
pub enum RelinkError {
    /// Input could not be decoded; nothing was produced.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Storing a field or deriving its link failed.
    #[error("Publish error: record {index} ('{record_id}'), field {field}: {source}")]
    Publish {
        /// Position of the record within the envelope.
        index: usize,
        /// Identifier of the record.
        record_id: String,
        /// Field that was being published.
        field: LinkedField,
        /// Error reported by the object store.
        #[source]
        source: BoxError,
    },
    /// Serializing the output failed.
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),
    /// A configured input limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// Configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
    /// I/O operation failed while reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelinkError {
    /// True when the error originated from malformed input.
    pub fn is_decode(&self) -> bool {
        matches!(self, RelinkError::Decode(_))
    }

    /// True when the error originated from the object store.
    pub fn is_publish(&self) -> bool {
        matches!(self, RelinkError::Publish { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RelinkError>;
