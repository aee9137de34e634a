//! Input size limits

use crate::constants::MAX_ENCODED_RECORD_BYTES;

/// Limits applied to an incoming envelope before any object is published.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum encoded envelope size in bytes (default: 6 MiB)
    pub max_envelope_bytes: usize,
    /// Maximum records per envelope (default: 10,000)
    pub max_records: usize,
    /// Maximum base64 payload length per record (default: base64 of 1000 KiB)
    pub max_payload_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_envelope_bytes: 6 * 1024 * 1024,
            max_records: 10_000,
            max_payload_bytes: MAX_ENCODED_RECORD_BYTES,
        }
    }
}

impl Limits {
    /// Reject an encoded envelope that is larger than `max_envelope_bytes`.
    pub fn check_envelope_len(&self, len: usize) -> crate::Result<()> {
        if len > self.max_envelope_bytes {
            return Err(crate::RelinkError::LimitExceeded(format!(
                "envelope is {} bytes (max: {})",
                len, self.max_envelope_bytes
            )));
        }
        Ok(())
    }

    /// Reject an envelope carrying more than `max_records` records.
    pub fn check_record_count(&self, count: usize) -> crate::Result<()> {
        if count > self.max_records {
            return Err(crate::RelinkError::LimitExceeded(format!(
                "envelope holds {} records (max: {})",
                count, self.max_records
            )));
        }
        Ok(())
    }

    /// Reject a record whose encoded payload exceeds `max_payload_bytes`.
    pub fn check_payload_len(&self, record_id: &str, len: usize) -> crate::Result<()> {
        if len > self.max_payload_bytes {
            return Err(crate::RelinkError::LimitExceeded(format!(
                "record '{}' payload is {} bytes (max: {})",
                record_id, len, self.max_payload_bytes
            )));
        }
        Ok(())
    }
}
