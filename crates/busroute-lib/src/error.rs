use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the bus route library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Database could not be located at the resolved path.
    #[error("database not found at {path}")]
    DatabaseNotFound { path: PathBuf },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for the transit database")]
    ProjectDirsUnavailable,

    /// Raised when the database lacks the routes/stops/buses tables.
    #[error("unsupported database schema; expected routes, stops and buses tables")]
    UnsupportedSchema,

    /// Raised when a stored record violates a data-model invariant.
    #[error("invalid {entity} record {id}: {message}")]
    InvalidRecord {
        entity: &'static str,
        id: i64,
        message: String,
    },

    /// Raised by non-SQLite store backends when a read fails.
    #[error("transit store unavailable: {message}")]
    Store { message: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::Store`] from any displayable cause.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}
