//! Relink Test Utilities
//!
//! Shared fixtures and object-store doubles for the relink test suites.

use relink_format::{encode_envelope, encode_log_entry, Envelope, LogEntry, Record};
use serde_json::Map;

pub mod stores;

pub use stores::{FailingStore, RecordingStore, StoreCall};

/// Builder for log entries with common patterns
#[derive(Debug, Clone, Default)]
pub struct LogEntryBuilder {
    entry: LogEntry,
}

impl LogEntryBuilder {
    /// Start from an entry with every field absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an entry with every field populated
    pub fn sample(n: usize) -> Self {
        Self::new()
            .request_id(&format!("req-{n:04}"))
            .session_id(&format!("sess-{}", n % 7))
            .timestamp("2024-05-01T12:00:00Z")
            .user_id(&format!("user-{}", n % 13))
            .server_ip("10.0.0.12")
            .message(&format!("handled request {n}"))
            .level("Info")
            .category("api")
            .request(&format!("{{\"method\":\"GET\",\"path\":\"/items/{n}\"}}"))
            .response(&format!("{{\"status\":200,\"item\":{n}}}"))
    }

    /// Set `RequestId`
    pub fn request_id(mut self, value: &str) -> Self {
        self.entry.request_id = Some(value.to_string());
        self
    }

    /// Set `SessionId`
    pub fn session_id(mut self, value: &str) -> Self {
        self.entry.session_id = Some(value.to_string());
        self
    }

    /// Set `Timestamp`
    pub fn timestamp(mut self, value: &str) -> Self {
        self.entry.timestamp = Some(value.to_string());
        self
    }

    /// Set `UserId`
    pub fn user_id(mut self, value: &str) -> Self {
        self.entry.user_id = Some(value.to_string());
        self
    }

    /// Set `ServerIp`
    pub fn server_ip(mut self, value: &str) -> Self {
        self.entry.server_ip = Some(value.to_string());
        self
    }

    /// Set `Message`
    pub fn message(mut self, value: &str) -> Self {
        self.entry.message = Some(value.to_string());
        self
    }

    /// Set `Level`
    pub fn level(mut self, value: &str) -> Self {
        self.entry.level = Some(value.to_string());
        self
    }

    /// Set `Category`
    pub fn category(mut self, value: &str) -> Self {
        self.entry.category = Some(value.to_string());
        self
    }

    /// Set `Request`
    pub fn request(mut self, value: &str) -> Self {
        self.entry.request = Some(value.to_string());
        self
    }

    /// Set `Response`
    pub fn response(mut self, value: &str) -> Self {
        self.entry.response = Some(value.to_string());
        self
    }

    /// Build the entry
    pub fn build(self) -> LogEntry {
        self.entry
    }
}

/// Builder for delivery-stream envelopes
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    envelope: Envelope,
}

impl EnvelopeBuilder {
    /// Envelope with typical delivery-stream metadata and no records
    pub fn new() -> Self {
        Self {
            envelope: Envelope {
                invocation_id: Some("00540a87-5050-496a-84e4-e7d92bbaf5e2".to_string()),
                delivery_stream_arn: Some(
                    "arn:aws:firehose:us-west-2:123456789012:deliverystream/app-logs".to_string(),
                ),
                region: Some("us-west-2".to_string()),
                records: Vec::new(),
                extra: Map::new(),
            },
        }
    }

    /// Append a record carrying `entry`
    pub fn entry(self, record_id: &str, entry: &LogEntry) -> Self {
        let data = encode_log_entry(entry).expect("log entry encodes");
        self.raw(record_id, &data)
    }

    /// Append a record with arbitrary `data`
    pub fn raw(mut self, record_id: &str, data: &str) -> Self {
        self.envelope.records.push(Record {
            record_id: record_id.to_string(),
            result: String::new(),
            data: data.to_string(),
            extra: Map::new(),
        });
        self
    }

    /// Append `count` sample records with ids `rec-0000`, `rec-0001`, ...
    pub fn samples(mut self, count: usize) -> Self {
        for n in 0..count {
            let entry = LogEntryBuilder::sample(n).build();
            self = self.entry(&format!("rec-{n:04}"), &entry);
        }
        self
    }

    /// Build the envelope
    pub fn build(self) -> Envelope {
        self.envelope
    }

    /// Build the envelope and encode it as JSON
    pub fn to_bytes(self) -> Vec<u8> {
        encode_envelope(&self.envelope).expect("envelope encodes")
    }
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
