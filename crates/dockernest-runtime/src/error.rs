//! Closed error taxonomy reported by runtime adapters.

use thiserror::Error;

/// Failure reported by a [`RuntimeClient`](crate::client::RuntimeClient).
///
/// Adapters translate every runtime-specific error into one of these
/// variants so callers never inspect daemon error internals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The addressed runtime object does not exist.
    #[error("runtime object not found")]
    NotFound,

    /// An object with the requested name already exists.
    #[error("runtime object name already in use")]
    Conflict,

    /// The daemon could not be reached or did not answer before the deadline.
    #[error("runtime unavailable: {0}")]
    Unavailable(String),

    /// The daemon refused the request.
    #[error("runtime rejected request: {0}")]
    Rejected(String),
}

/// Convenience alias used throughout the adapter.
pub type Result<T> = std::result::Result<T, RuntimeError>;
