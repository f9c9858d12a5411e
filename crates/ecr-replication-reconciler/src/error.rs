//! Error types for the reconciler crate.
//!
//! Every error names the operation it came from. Remote failures are never
//! retried here; [`ReconcileError::is_retryable`] tells the caller whether
//! retrying can help.

use std::path::PathBuf;

use ecr_replication_client::{ClientError, ClientErrorKind};
use ecr_replication_core::{DriftReport, SchemaError, ValidationErrors};
use thiserror::Error;

use crate::state::ResourceState;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Reconciler operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// First write of a declared configuration.
    Create,
    /// Replacement of a managed configuration.
    Update,
    /// Reset to the empty configuration.
    Delete,
    /// Standalone read.
    Read,
    /// Read compared against the local record.
    Refresh,
    /// Adoption of an existing remote configuration.
    Import,
}

impl Operation {
    /// Returns a string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Read => "read",
            Self::Refresh => "refresh",
            Self::Import => "import",
        }
    }

    /// Returns true for operations that only read the remote configuration.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::Read | Self::Refresh | Self::Import)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur while reconciling.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The declared configuration is invalid. Nothing was sent.
    #[error("{operation}: {errors}")]
    Validation {
        /// Failing operation.
        operation: Operation,
        /// Every validation failure.
        errors: ValidationErrors,
    },

    /// The remote call failed for network or throttling reasons, or a
    /// read-only call was not authorized.
    #[error("{operation}: transient remote failure: {source}")]
    Transient {
        /// Failing operation.
        operation: Operation,
        /// Client error.
        #[source]
        source: ClientError,
    },

    /// The remote API rejected the call.
    #[error("{operation}: remote rejected the request: {source}")]
    Remote {
        /// Failing operation.
        operation: Operation,
        /// Client error.
        #[source]
        source: ClientError,
    },

    /// The remote API returned data that breaks its contract.
    #[error("{operation}: {source}")]
    Schema {
        /// Failing operation.
        operation: Operation,
        /// Offending path and reason.
        #[source]
        source: SchemaError,
    },

    /// The write succeeded but the confirming read disagrees.
    #[error("{operation}: remote configuration does not match the declaration: {report}")]
    DriftMismatch {
        /// Failing operation.
        operation: Operation,
        /// Every differing path.
        report: DriftReport,
    },

    /// The caller aborted the operation.
    #[error("{operation}: cancelled")]
    Cancelled {
        /// Aborted operation.
        operation: Operation,
    },

    /// The operation is not allowed in the current state.
    #[error("{operation}: not allowed while the configuration is {state}")]
    InvalidState {
        /// Rejected operation.
        operation: Operation,
        /// Current state.
        state: ResourceState,
    },

    /// The remote registry is not the one expected.
    #[error("{operation}: remote registry is '{actual}', expected '{expected}'")]
    IdentityMismatch {
        /// Failing operation.
        operation: Operation,
        /// Expected registry id.
        expected: String,
        /// Registry id reported remotely.
        actual: String,
    },

    /// An import identifier is not a registry id.
    #[error("import: invalid registry id '{identifier}': expected 12 digits")]
    InvalidIdentifier {
        /// The rejected identifier.
        identifier: String,
    },

    /// The local state file could not be read or written.
    #[error("state file '{}': {source}", .path.display())]
    State {
        /// State file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl ReconcileError {
    /// Maps a client error raised during `operation`.
    ///
    /// An authorization failure on a read-only operation is transient; the
    /// same failure on a write is a rejection.
    #[must_use]
    pub fn from_client(operation: Operation, source: ClientError) -> Self {
        match source.kind {
            ClientErrorKind::Throttled | ClientErrorKind::Network => {
                Self::Transient { operation, source }
            }
            ClientErrorKind::NotAuthorized if operation.is_read_only() => {
                Self::Transient { operation, source }
            }
            ClientErrorKind::Malformed => Self::Schema {
                operation,
                source: SchemaError::new("response", source.message),
            },
            ClientErrorKind::Cancelled => Self::Cancelled { operation },
            ClientErrorKind::NotAuthorized
            | ClientErrorKind::NotFound
            | ClientErrorKind::InvalidRequest
            | ClientErrorKind::Configuration
            | ClientErrorKind::Other => Self::Remote { operation, source },
        }
    }

    /// Returns the operation the error came from, if any.
    #[must_use]
    pub const fn operation(&self) -> Option<Operation> {
        match self {
            Self::Validation { operation, .. }
            | Self::Transient { operation, .. }
            | Self::Remote { operation, .. }
            | Self::Schema { operation, .. }
            | Self::DriftMismatch { operation, .. }
            | Self::Cancelled { operation }
            | Self::InvalidState { operation, .. }
            | Self::IdentityMismatch { operation, .. } => Some(*operation),
            Self::InvalidIdentifier { .. } => Some(Operation::Import),
            Self::State { .. } => None,
        }
    }

    /// Returns true if repeating the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::DriftMismatch { .. })
    }

    /// Returns true if the caller cancelled the operation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_mapping() {
        let err =
            ReconcileError::from_client(Operation::Update, ClientError::throttled("slow down"));
        assert!(matches!(err, ReconcileError::Transient { .. }));
        assert!(err.is_retryable());

        let err = ReconcileError::from_client(Operation::Read, ClientError::malformed("bad json"));
        assert!(matches!(err, ReconcileError::Schema { .. }));
        assert!(!err.is_retryable());

        let err = ReconcileError::from_client(Operation::Create, ClientError::cancelled("abort"));
        assert!(err.is_cancelled());

        let err =
            ReconcileError::from_client(Operation::Delete, ClientError::not_authorized("denied"));
        assert!(matches!(err, ReconcileError::Remote { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_unauthorized_read_is_transient() {
        for operation in [Operation::Read, Operation::Refresh, Operation::Import] {
            let err = ReconcileError::from_client(operation, ClientError::not_authorized("denied"));
            match err {
                ReconcileError::Transient { operation: op, source } => {
                    assert_eq!(op, operation);
                    assert_eq!(source.kind, ClientErrorKind::NotAuthorized);
                }
                other => panic!("expected transient error, got {other:?}"),
            }
        }

        let err =
            ReconcileError::from_client(Operation::Create, ClientError::not_authorized("denied"));
        assert!(matches!(err, ReconcileError::Remote { .. }));
    }

    #[test]
    fn test_error_names_operation() {
        let err = ReconcileError::from_client(Operation::Update, ClientError::network("reset"));
        assert_eq!(err.operation(), Some(Operation::Update));
        assert_eq!(
            err.to_string(),
            "update: transient remote failure: network error: reset"
        );

        let err = ReconcileError::InvalidIdentifier {
            identifier: "abc".to_string(),
        };
        assert_eq!(err.operation(), Some(Operation::Import));
    }

    #[test]
    fn test_invalid_state_display() {
        let err = ReconcileError::InvalidState {
            operation: Operation::Create,
            state: ResourceState::Managed,
        };
        assert_eq!(
            err.to_string(),
            "create: not allowed while the configuration is managed"
        );
    }
}
