//! # ECR Replication Core
//!
//! Core types and pure logic for managing a registry's cross-region
//! replication configuration.
//!
//! This crate provides:
//!
//! - [`ReplicationConfiguration`] - the canonical declared/observed tree
//! - [`validation`] - local validation that runs before any remote call
//! - [`WireConfiguration`] - the registry API's JSON representation
//! - [`to_wire`] / [`from_wire`] - shape normalization between the two
//! - [`Planner`] - full-replacement payload construction
//! - [`compare`] / [`confirm`] - drift comparison with per-path diagnostics
//!
//! Nothing in this crate performs I/O.
//!
//! ## Example
//!
//! ```rust
//! use ecr_replication_core::{
//!     compare, Planner, ReplicationConfiguration, ReplicationDestination, ReplicationRule,
//!     RepositoryFilter,
//! };
//!
//! let desired = ReplicationConfiguration::with_rule(
//!     ReplicationRule::new()
//!         .with_destination(ReplicationDestination::new("us-west-2", "123456789012"))
//!         .with_filter(RepositoryFilter::prefix("prod-")),
//! );
//!
//! let plan = Planner::plan(&desired).expect("valid configuration");
//! assert_eq!(plan.summary.destinations, 1);
//!
//! let drift = compare(&desired, &ReplicationConfiguration::empty());
//! assert_eq!(drift.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod drift;
pub mod error;
pub mod model;
pub mod normalize;
pub mod plan;
pub mod validation;
pub mod wire;


// Re-export main types at crate root
pub use drift::{compare, confirm, Difference, DriftReport};
pub use error::SchemaError;
pub use model::{
    is_account_id, is_region, ReplicationConfiguration, ReplicationDestination, ReplicationRule,
    RepositoryFilter, RepositoryFilterType, MAX_DESTINATIONS_PER_RULE, MAX_FILTERS_PER_RULE,
    MAX_FILTER_LENGTH, MAX_RULES,
};
pub use normalize::{from_wire, to_wire};
pub use plan::{PlanSummary, Planner, ReplacementPlan};
pub use validation::{Validate, ValidationError, ValidationErrorKind, ValidationErrors};
pub use wire::{
    PutReplicationConfigurationRequest, WireConfiguration, WireDestination, WireRegistry,
    WireRepositoryFilter, WireRule,
};
