//! Base64 payload codec and envelope encoding

use crate::error::{DecodeError, RelinkError, Result};
use crate::types::{Envelope, LogEntry, Record};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Decode an envelope from its JSON encoding.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope> {
    serde_json::from_slice(bytes).map_err(|err| DecodeError::Envelope(err).into())
}

/// Encode an envelope as compact JSON.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>> {
    serde_json::to_vec(envelope).map_err(RelinkError::Encode)
}

/// Encode an envelope as indented JSON.
pub fn encode_envelope_pretty(envelope: &Envelope) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(envelope).map_err(RelinkError::Encode)
}

/// Base64-encode the JSON form of a log entry.
pub fn encode_log_entry(entry: &LogEntry) -> Result<String> {
    let json = serde_json::to_vec(entry).map_err(RelinkError::Encode)?;
    Ok(STANDARD.encode(json))
}

impl Record {
    /// Decode this record's payload. `index` is the record's position in its
    /// envelope and only used for error context.
    pub fn decode_payload(&self, index: usize) -> Result<LogEntry> {
        let raw = STANDARD
            .decode(self.data.as_bytes())
            .map_err(|source| DecodeError::Base64 {
                index,
                record_id: self.record_id.clone(),
                source,
            })?;

        serde_json::from_slice(&raw).map_err(|source| {
            DecodeError::LogEntry {
                index,
                record_id: self.record_id.clone(),
                source,
            }
            .into()
        })
    }

    /// Replace this record's payload with the encoding of `entry`.
    pub fn encode_payload(&mut self, entry: &LogEntry) -> Result<()> {
        self.data = encode_log_entry(entry)?;
        Ok(())
    }
}
