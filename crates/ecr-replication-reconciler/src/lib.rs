//! # ECR Replication Reconciler
//!
//! Drives a registry's replication configuration to its declaration.
//!
//! This crate provides:
//!
//! - [`Reconciler`] - create, update, apply, delete, read, refresh and import
//! - [`ResourceState`] / [`ManagedRecord`] - the local lifecycle record
//! - [`StateFile`] - JSON persistence of that record
//! - [`ReconcileError`] - every failure, tagged with its [`Operation`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use ecr_replication_client::{ClientConfig, HttpRegistryClient};
//! use ecr_replication_core::{ReplicationConfiguration, ReplicationDestination, ReplicationRule};
//! use ecr_replication_reconciler::{Reconciler, StateFile};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StateFile::new(".ecr-replication/state.json");
//! let client = HttpRegistryClient::new(ClientConfig::new("us-east-1"))?;
//! let mut reconciler = Reconciler::new(client).with_record(store.load()?);
//!
//! let desired = ReplicationConfiguration::with_rule(
//!     ReplicationRule::new().with_destination(ReplicationDestination::new("us-west-2", "123456789012")),
//! );
//! let result = reconciler.apply(&desired).await;
//! store.store(reconciler.record())?;
//! result?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod reconciler;
pub mod state;
pub mod store;

pub use error::{Operation, ReconcileError, Result};
pub use reconciler::Reconciler;
pub use state::{ManagedRecord, ResourceState};
pub use store::StateFile;
