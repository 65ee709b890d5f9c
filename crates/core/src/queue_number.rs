//! Queue number reset periods and service-type naming rules.
//!
//! The number itself (`prefix` + three-digit sequence) is rendered by the
//! insert in `QueueEntryRepo::issue` so the sequence is taken atomically.

use validator::Validate;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Period key used when numbering never resets.
pub const CONTINUOUS_PERIOD: &str = "continuous";

/// The numbering period a ticket issued at `now` belongs to.
///
/// Daily reset uses the UTC calendar date, so sequences restart at
/// midnight UTC.
pub fn period_key(now: Timestamp, reset_daily: bool) -> String {
    if reset_daily {
        now.format("%Y-%m-%d").to_string()
    } else {
        CONTINUOUS_PERIOD.to_string()
    }
}

/// Validated service-type naming input.
#[derive(Debug, Validate)]
pub struct ServiceTypeNaming {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 4))]
    pub prefix: String,
}

impl ServiceTypeNaming {
    pub fn new(name: &str, prefix: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            prefix: prefix.trim().to_string(),
        }
    }

    /// Check lengths and that the prefix is ASCII letters only.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if !self.prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::Validation(
                "prefix must contain only ASCII letters".into(),
            ));
        }
        Ok(())
    }
}
