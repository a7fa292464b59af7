//! Error types for forecast-store.

use std::path::PathBuf;

/// Result type for forecast-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in forecast-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The database was written by a newer schema than this build knows.
    #[error("Unsupported schema version {found} (this build supports up to {supported})")]
    UnsupportedSchemaVersion { found: i32, supported: i32 },

    /// A column held a value of the wrong type.
    #[error("Unexpected value in column {0}")]
    UnexpectedValue(&'static str),

    /// An ordering clause could not be parsed.
    #[error("Invalid sort order: {0}")]
    InvalidSortOrder(String),

    /// Another thread panicked while holding the connection.
    #[error("Database connection lock poisoned")]
    LockPoisoned,
}
