//! Error types for forecast-types.

use thiserror::Error;

/// Reasons a [`WeatherRecord`](crate::WeatherRecord) cannot be persisted.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum RecordError {
    /// The record's date is not the start of a UTC day.
    #[error("date {0} is not normalized to the start of a UTC day")]
    NotNormalized(i64),

    /// A measurement is NaN or infinite.
    #[error("field `{0}` is not a finite number")]
    NonFiniteField(&'static str),

    /// A mandatory field was never set.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Errors raised when parsing contract identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The name does not match any column of the weather table.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

/// Result type alias using forecast-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
