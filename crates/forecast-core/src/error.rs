//! Error types for forecast-core.
//!
//! Every failure aborts the operation that raised it; the provider never
//! applies part of a write and reports success.
//!
//! | Error | Cause | Recovery |
//! |-------|-------|----------|
//! | [`Error::UnrecognizedLocator`] | The router could not classify the locator | Fix the caller, do not retry |
//! | [`Error::InvalidRecord`] | A batch contained an unstorable record | Nothing was written; refetch before retrying |
//! | [`Error::UnsupportedOperation`] | Single-row insert, update, type lookup, or a write to a per-day locator | Programming error |
//! | [`Error::StorageFailure`] | SQLite is unavailable or the file is corrupt | Not recoverable locally |
//! | [`Error::Config`] | Configuration could not be loaded or validated | Fix configuration and restart |

use thiserror::Error;

use forecast_types::RecordError;

use crate::config::ConfigError;

/// Errors that can occur in the forecast provider.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The locator matches neither the all-records nor the per-day shape.
    #[error("Unrecognized locator: {0}")]
    UnrecognizedLocator(String),

    /// A record in a batch failed validation. The whole batch was discarded.
    #[error("Invalid record at index {index}: {source}")]
    InvalidRecord {
        /// Position of the offending record in the batch.
        index: usize,
        /// Why the record was rejected.
        #[source]
        source: RecordError,
    },

    /// The operation is not part of the provider's contract.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The underlying store failed.
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] forecast_store::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias using forecast-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnrecognizedLocator("content://x/other".to_string());
        assert_eq!(err.to_string(), "Unrecognized locator: content://x/other");

        let err = Error::InvalidRecord {
            index: 3,
            source: RecordError::NotNormalized(5),
        };
        assert_eq!(
            err.to_string(),
            "Invalid record at index 3: date 5 is not normalized to the start of a UTC day"
        );

        let err = Error::UnsupportedOperation("insert".to_string());
        assert_eq!(err.to_string(), "Unsupported operation: insert");
    }

    #[test]
    fn test_invalid_record_exposes_source() {
        use std::error::Error as _;

        let err = Error::InvalidRecord {
            index: 0,
            source: RecordError::MissingField("humidity"),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_store_error_converts_to_storage_failure() {
        let err: Error = forecast_store::Error::LockPoisoned.into();
        assert!(matches!(err, Error::StorageFailure(_)));
    }
}
