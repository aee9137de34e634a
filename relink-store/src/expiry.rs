//! Link lifetime handling

use crate::error::{Result, StoreError};
use chrono::{DateTime, Duration, Months, Utc};
use relink_format::constants::DEFAULT_LINK_EXPIRY_YEARS;
use serde::{Deserialize, Serialize};

/// How long a presigned link stays valid after it is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkExpiry {
    /// Calendar years after issue
    Years(u32),
    /// Days after issue
    Days(u32),
}

impl Default for LinkExpiry {
    fn default() -> Self {
        LinkExpiry::Years(DEFAULT_LINK_EXPIRY_YEARS)
    }
}

impl LinkExpiry {
    /// Absolute expiry instant for a link issued at `issued_at`.
    pub fn deadline(&self, issued_at: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let deadline = match *self {
            LinkExpiry::Years(0) | LinkExpiry::Days(0) => None,
            LinkExpiry::Years(years) => years
                .checked_mul(12)
                .and_then(|months| issued_at.checked_add_months(Months::new(months))),
            LinkExpiry::Days(days) => {
                issued_at.checked_add_signed(Duration::days(i64::from(days)))
            }
        };

        deadline.ok_or_else(|| StoreError::InvalidExpiry(format!("{:?}", self)))
    }

    /// Expiry instant for a link issued now.
    pub fn from_now(&self) -> Result<DateTime<Utc>> {
        self.deadline(Utc::now())
    }
}
