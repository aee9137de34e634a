//! Transformer configuration
//!
//! Options are layered: defaults, then an optional TOML file, then
//! `RELINK_*` environment variables, then whatever the caller sets last.

use relink_format::constants::{DEFAULT_BUCKET, DEFAULT_REGION, JSON_CONTENT_TYPE};
use relink_format::{Limits, RelinkError, Result};
use relink_store::LinkExpiry;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`TransformOptions::bucket`].
pub const ENV_BUCKET: &str = "RELINK_BUCKET";
/// Environment variable overriding [`TransformOptions::region`].
pub const ENV_REGION: &str = "RELINK_REGION";
/// Environment variable overriding the link expiry, in days.
pub const ENV_EXPIRY_DAYS: &str = "RELINK_EXPIRY_DAYS";

/// Options controlling how envelopes are transformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Bucket every field object is written to
    pub bucket: String,
    /// Region of the object store
    pub region: String,
    /// Lifetime of the links written into records
    pub link_expiry: LinkExpiry,
    /// Content type declared on every object
    pub content_type: String,
    /// Input limits
    pub limits: Limits,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
            link_expiry: LinkExpiry::default(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            limits: Limits::default(),
        }
    }
}

impl TransformOptions {
    /// Parse options from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|err| RelinkError::Config(err.to_string()))
    }

    /// Read and parse a TOML options file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| {
            RelinkError::Config(format!("reading {} failed: {}", path.display(), err))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Apply `RELINK_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply `RELINK_*` overrides using `lookup` to resolve variables.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup(ENV_BUCKET) {
            self.bucket = bucket;
        }
        if let Some(region) = lookup(ENV_REGION) {
            self.region = region;
        }
        if let Some(days) = lookup(ENV_EXPIRY_DAYS) {
            let days = days.trim().parse::<u32>().map_err(|err| {
                RelinkError::Config(format!("{ENV_EXPIRY_DAYS}='{days}': {err}"))
            })?;
            self.link_expiry = LinkExpiry::Days(days);
        }
        Ok(self)
    }

    /// Check the options are usable.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(RelinkError::Config("bucket must not be empty".into()));
        }
        if self.content_type.trim().is_empty() {
            return Err(RelinkError::Config("content_type must not be empty".into()));
        }
        if matches!(self.link_expiry, LinkExpiry::Days(0) | LinkExpiry::Years(0)) {
            return Err(RelinkError::Config("link expiry must be positive".into()));
        }
        Ok(())
    }
}
