//! Constants shared across the relink crates

/// Result marker written to every transformed record.
pub const RESULT_OK: &str = "Ok";

/// Content type declared for every published field object.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Bucket used when no configuration overrides it.
pub const DEFAULT_BUCKET: &str = "relink-logs";

/// Region label used when no configuration overrides it.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Default lifetime of a published link, in calendar years.
pub const DEFAULT_LINK_EXPIRY_YEARS: u32 = 2;

/// Length of a generated object key (UUID v4 as bare lowercase hex).
pub const OBJECT_KEY_LEN: usize = 32;

/// Envelope member holding the record array.
pub const RECORDS_FIELD: &str = "records";

/// Largest record payload a delivery stream accepts, before base64.
pub const MAX_RECORD_BYTES: usize = 1000 * 1024;

/// Base64 length of a [`MAX_RECORD_BYTES`] payload.
pub const MAX_ENCODED_RECORD_BYTES: usize = 4 * MAX_RECORD_BYTES.div_ceil(3);
