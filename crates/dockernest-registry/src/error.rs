//! Registry storage errors.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of the persistence layer behind the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The database rejected or failed a statement.
    #[error("registry storage error: {source}")]
    Storage {
        /// Underlying database error.
        #[from]
        source: rusqlite::Error,
    },

    /// The database location could not be prepared.
    #[error("registry I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The registry cannot serve requests.
    #[error("registry unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// Convenience alias used throughout the registry.
pub type Result<T> = std::result::Result<T, RegistryError>;
