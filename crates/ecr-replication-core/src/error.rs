//! Error types for replication configuration handling.

use thiserror::Error;

/// The remote API returned a configuration that breaks its own contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed replication configuration at '{path}': {reason}")]
pub struct SchemaError {
    /// Path of the offending element, e.g. `rule[0].repository_filter[2].filter_type`.
    pub path: String,
    /// What was wrong with it.
    pub reason: String,
}

impl SchemaError {
    /// Creates a schema error.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
