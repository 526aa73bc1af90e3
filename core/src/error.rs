//! Error types for nutrilog-core.

use std::path::PathBuf;

/// Result type for nutrilog-core operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the record stores, the goal calculator and the facade.
///
/// Absent records are not errors: lookups return `None` or an empty list.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying storage engine failed to read, write or initialize.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Malformed input rejected before it reached storage.
    #[error("Invalid input: {0}")]
    Validation(String),
}

/// The single storage failure kind, with the engine-level cause attached.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage(StorageError::Io {
            path: path.into(),
            source,
        })
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Sqlite(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Storage(StorageError::Serialization(e))
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Storage(StorageError::Csv(e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Error::Storage(StorageError::Poisoned)
    }
}
