//! # ECR Replication Test
//!
//! Test support for code that manages replication configuration.
//!
//! This crate provides:
//!
//! - [`MockRegistry`] - an in-memory [`RemoteClient`](ecr_replication_client::RemoteClient)
//!   with queued failures, stale reads and read overrides
//! - Fixtures for common declared configurations
//! - Assertion helpers that print the full drift report on failure
//!
//! ## Example
//!
//! ```rust
//! use ecr_replication_test::{assert_remote_matches, replication_to, wire, MockRegistry};
//!
//! let declared = replication_to(&["us-west-2", "us-east-2"]);
//! let registry = MockRegistry::new().with_configuration(wire(&declared));
//!
//! assert_remote_matches(&registry, &declared);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assertions;
pub mod fixtures;
pub mod mock_registry;

pub use assertions::{assert_no_drift, assert_remote_matches, assert_untouched};
pub use fixtures::{
    replication_to, replication_with_filters, wire, ACCOUNT_ID, OTHER_ACCOUNT_ID,
};
pub use mock_registry::MockRegistry;
