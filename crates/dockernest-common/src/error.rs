//! Caller-facing failure taxonomy for lifecycle operations.
//!
//! Lower-level crates define their own domain-specific error enums (the
//! runtime adapter taxonomy, registry storage errors). The lifecycle manager
//! folds those into [`LifecycleError`], which is the only error type that
//! crosses the core boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure returned by every lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// No record with this id is owned by the caller.
    ///
    /// Records owned by other users are reported identically, so a caller
    /// cannot probe for their existence.
    #[error("workload record not found")]
    RecordNotFound,

    /// The record exists but the runtime object it references does not.
    #[error("runtime workload {runtime_id} no longer exists")]
    RuntimeObjectNotFound {
        /// Runtime identifier held by the record.
        runtime_id: String,
    },

    /// A required creation field is missing or empty.
    #[error("missing required field: {field}")]
    ValidationFailed {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The runtime already holds an object with the derived name.
    #[error("runtime name {name} is already in use")]
    RuntimeConflict {
        /// Runtime-facing name that collided.
        name: String,
    },

    /// The runtime daemon could not be reached or did not answer in time.
    #[error("container runtime unavailable: {detail}")]
    RuntimeUnavailable {
        /// Description of the connectivity failure.
        detail: String,
    },

    /// The runtime or registry reported a failure.
    #[error("operation failed: {detail}")]
    OperationFailed {
        /// Diagnostic message from the failing collaborator.
        detail: String,
    },

    /// The runtime created the workload but its record could not be stored.
    ///
    /// The runtime object is left in place and is attributable through its
    /// owner label.
    #[error("workload {runtime_id} was created but could not be recorded: {detail}")]
    PartialCreateFailure {
        /// Identifier of the orphaned runtime object.
        runtime_id: String,
        /// Description of the persistence failure.
        detail: String,
    },
}

impl LifecycleError {
    /// Returns the stable, enumerable kind of this failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::RecordNotFound => FailureKind::RecordNotFound,
            Self::RuntimeObjectNotFound { .. } => FailureKind::RuntimeObjectNotFound,
            Self::ValidationFailed { .. } => FailureKind::ValidationFailed,
            Self::RuntimeConflict { .. } => FailureKind::RuntimeConflict,
            Self::RuntimeUnavailable { .. } => FailureKind::RuntimeUnavailable,
            Self::OperationFailed { .. } => FailureKind::OperationFailed,
            Self::PartialCreateFailure { .. } => FailureKind::PartialCreateFailure,
        }
    }

    /// Builds an [`LifecycleError::OperationFailed`] from any displayable cause.
    pub fn operation_failed(detail: impl fmt::Display) -> Self {
        Self::OperationFailed {
            detail: detail.to_string(),
        }
    }
}

/// Stable discriminant of a [`LifecycleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// See [`LifecycleError::RecordNotFound`].
    RecordNotFound,
    /// See [`LifecycleError::RuntimeObjectNotFound`].
    RuntimeObjectNotFound,
    /// See [`LifecycleError::ValidationFailed`].
    ValidationFailed,
    /// See [`LifecycleError::RuntimeConflict`].
    RuntimeConflict,
    /// See [`LifecycleError::RuntimeUnavailable`].
    RuntimeUnavailable,
    /// See [`LifecycleError::OperationFailed`].
    OperationFailed,
    /// See [`LifecycleError::PartialCreateFailure`].
    PartialCreateFailure,
}

impl FailureKind {
    /// Returns the snake-case name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecordNotFound => "record_not_found",
            Self::RuntimeObjectNotFound => "runtime_object_not_found",
            Self::ValidationFailed => "validation_failed",
            Self::RuntimeConflict => "runtime_conflict",
            Self::RuntimeUnavailable => "runtime_unavailable",
            Self::OperationFailed => "operation_failed",
            Self::PartialCreateFailure => "partial_create_failure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration: {message}")]
pub struct ConfigError {
    /// Description of the invalid configuration.
    pub message: String,
}

/// Convenience alias used by lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = LifecycleError::RuntimeObjectNotFound {
            runtime_id: "abc".into(),
        };
        assert_eq!(err.kind(), FailureKind::RuntimeObjectNotFound);
        assert_eq!(LifecycleError::RecordNotFound.kind(), FailureKind::RecordNotFound);
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&FailureKind::PartialCreateFailure).unwrap();
        assert_eq!(json, "\"partial_create_failure\"");
        assert_eq!(FailureKind::PartialCreateFailure.to_string(), "partial_create_failure");
    }

    #[test]
    fn record_not_found_carries_no_identifier() {
        assert_eq!(
            LifecycleError::RecordNotFound.to_string(),
            "workload record not found"
        );
    }

    #[test]
    fn partial_create_message_names_runtime_object() {
        let err = LifecycleError::PartialCreateFailure {
            runtime_id: "deadbeef".into(),
            detail: "disk full".into(),
        };
        assert!(err.to_string().contains("deadbeef"));
        assert!(err.to_string().contains("disk full"));
    }
}
