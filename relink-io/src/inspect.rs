//! Decode-only envelope inspection
//!
//! Runs the same decoding as the transformer without touching any store, so
//! a batch can be checked before it is published.

use relink_format::{decode_envelope, Limits, Result};
use serde::Serialize;

/// Summary of one decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordInspection {
    /// Position in the envelope
    pub index: usize,
    /// Record identifier
    pub record_id: String,
    /// Result status as received
    pub result: String,
    /// Length of the base64 payload
    pub payload_bytes: usize,
    /// Length of the `Request` field, `None` when null or absent
    pub request_bytes: Option<usize>,
    /// Length of the `Response` field, `None` when null or absent
    pub response_bytes: Option<usize>,
    /// Log level, when present
    pub level: Option<String>,
    /// Log category, when present
    pub category: Option<String>,
}

/// Summary of a decoded envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeInspection {
    /// Invocation identifier, when present
    pub invocation_id: Option<String>,
    /// Delivery stream identifier, when present
    pub delivery_stream_arn: Option<String>,
    /// Region label, when present
    pub region: Option<String>,
    /// Records in envelope order
    pub records: Vec<RecordInspection>,
}

impl EnvelopeInspection {
    /// Total bytes the transformer would upload for this envelope.
    pub fn upload_bytes(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.request_bytes.unwrap_or(0) + r.response_bytes.unwrap_or(0))
            .sum()
    }
}

/// Decode an envelope and every payload in it.
///
/// Fails on the first record that would fail during a transform.
pub fn inspect_envelope(input: &[u8], limits: &Limits) -> Result<EnvelopeInspection> {
    limits.check_envelope_len(input.len())?;
    let envelope = decode_envelope(input)?;
    limits.check_record_count(envelope.records.len())?;

    let mut records = Vec::with_capacity(envelope.records.len());
    for (index, record) in envelope.records.iter().enumerate() {
        limits.check_payload_len(&record.record_id, record.data.len())?;
        let entry = record.decode_payload(index)?;
        records.push(RecordInspection {
            index,
            record_id: record.record_id.clone(),
            result: record.result.clone(),
            payload_bytes: record.data.len(),
            request_bytes: entry.request.as_ref().map(String::len),
            response_bytes: entry.response.as_ref().map(String::len),
            level: entry.level,
            category: entry.category,
        });
    }

    Ok(EnvelopeInspection {
        invocation_id: envelope.invocation_id,
        delivery_stream_arn: envelope.delivery_stream_arn,
        region: envelope.region,
        records,
    })
}
