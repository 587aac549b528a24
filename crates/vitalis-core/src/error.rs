//! Core error types for vitalis-core.
//!
//! This module defines the engine's error hierarchy using thiserror.
//! Pure calculators fail fast with validation or invariant errors;
//! stateful operations additionally surface storage and not-found cases.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Core error type for vitalis-core.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed input at an operation boundary (never silently clamped)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A domain invariant was violated; a programming error, not retryable
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// Storage collaborator failure, propagated unchanged (no retries)
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// No prior record exists for the owner ("no data yet", not a failure
    /// of any calculator)
    #[error("No {resource} record found for owner '{owner_id}'")]
    NotFound {
        resource: &'static str,
        owner_id: String,
    },
}

/// Validation errors for engine inputs.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Numeric parameter out of its documented range or non-finite
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Wake time must come after bed time
    #[error("Invalid time range: wake_time ({wake}) must be after bed_time ({bed})")]
    InvalidTimeRange {
        bed: DateTime<Utc>,
        wake: DateTime<Utc>,
    },
}

impl ValidationError {
    /// Shorthand for the common field/message case.
    pub fn invalid_value(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: std::path::PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Filesystem error while locating or creating the data directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted row could not be decoded into a domain type
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for EngineError
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
