//! Relink Format - Core model for delivery-stream record relinking
//!
//! This crate provides the data model and encoding utilities shared by the
//! relink crates, with no I/O or object-store dependencies. It includes:
//!
//! - Envelope, record and log entry types
//! - Base64 payload codec
//! - Error types
//! - Input limits
//! - Constants

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod error;
pub mod limits;
pub mod payload;
pub mod types;

// Re-export commonly used types
pub use error::{BoxError, DecodeError, RelinkError, Result};
pub use limits::Limits;
pub use payload::{decode_envelope, encode_envelope, encode_envelope_pretty, encode_log_entry};
pub use types::{Envelope, LinkedField, LogEntry, Record};
