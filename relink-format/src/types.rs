//! Envelope, record and log entry model
//!
//! Member names follow the delivery-stream transformation contract:
//! camelCase on the envelope and records, PascalCase inside log entries.
//! Members the model does not name are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Batch of records handed to the transformer by the delivery stream.
///
/// Absent metadata members are written back as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Identifier of this transformation invocation
    #[serde(default)]
    pub invocation_id: Option<String>,
    /// Identifier of the delivery stream that produced the batch
    #[serde(default)]
    pub delivery_stream_arn: Option<String>,
    /// Region label of the delivery stream
    #[serde(default)]
    pub region: Option<String>,
    /// Records in delivery order
    pub records: Vec<Record>,
    /// Any other top-level members
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One delivery-stream record wrapping a base64 log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Record identifier, echoed back unchanged
    pub record_id: String,
    /// Processing status; absent on delivery-stream input
    #[serde(default)]
    pub result: String,
    /// Base64 of the JSON-encoded [`LogEntry`]
    pub data: String,
    /// Any other record members (e.g. arrival timestamps)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decoded record payload.
///
/// Every field is nullable on the wire; a missing field reads as `None` and
/// is written back as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogEntry {
    /// Correlation id of the logged request
    #[serde(default)]
    pub request_id: Option<String>,
    /// Session the request belonged to
    #[serde(default)]
    pub session_id: Option<String>,
    /// Time the entry was logged
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Authenticated user, if any
    #[serde(default)]
    pub user_id: Option<String>,
    /// Address of the server that logged the entry
    #[serde(default)]
    pub server_ip: Option<String>,
    /// Free-form log message
    #[serde(default)]
    pub message: Option<String>,
    /// Log level label
    #[serde(default)]
    pub level: Option<String>,
    /// Log category label
    #[serde(default)]
    pub category: Option<String>,
    /// Request body; replaced by a link on output
    #[serde(default)]
    pub request: Option<String>,
    /// Response body; replaced by a link on output
    #[serde(default)]
    pub response: Option<String>,
    /// Any other payload members
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Log entry field that is offloaded to the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkedField {
    /// `Request`
    Request,
    /// `Response`
    Response,
}

impl LinkedField {
    /// Both offloaded fields, in publish order.
    pub const ALL: [LinkedField; 2] = [LinkedField::Request, LinkedField::Response];

    /// Wire name of the field inside a log entry.
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkedField::Request => "Request",
            LinkedField::Response => "Response",
        }
    }
}

impl fmt::Display for LinkedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LogEntry {
    /// Borrow the current value of an offloaded field.
    pub fn linked(&self, field: LinkedField) -> Option<&str> {
        match field {
            LinkedField::Request => self.request.as_deref(),
            LinkedField::Response => self.response.as_deref(),
        }
    }

    /// Replace an offloaded field with its link.
    pub fn set_linked(&mut self, field: LinkedField, link: String) {
        match field {
            LinkedField::Request => self.request = Some(link),
            LinkedField::Response => self.response = Some(link),
        }
    }
}
