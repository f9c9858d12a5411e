//! Replacement planning.
//!
//! The registry API has no partial-update verb: every write replaces the
//! whole configuration. A plan is therefore always the complete desired
//! tree, never a patch against what is currently stored remotely.

use std::fmt;

use serde::Serialize;

use crate::model::ReplicationConfiguration;
use crate::normalize::to_wire;
use crate::validation::ValidationErrors;
use crate::wire::WireConfiguration;

/// Counts describing a planned payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    /// Number of rules in the payload.
    pub rules: usize,
    /// Number of destinations across all rules.
    pub destinations: usize,
    /// Number of repository filters across all rules.
    pub repository_filters: usize,
}

impl PlanSummary {
    /// Returns true if the payload resets the registry to no replication.
    #[must_use]
    pub const fn is_reset(&self) -> bool {
        self.rules == 0
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reset() {
            write!(f, "reset to empty configuration")
        } else {
            write!(
                f,
                "{} rule(s), {} destination(s), {} repository filter(s)",
                self.rules, self.destinations, self.repository_filters
            )
        }
    }
}

/// A full-replacement payload ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacementPlan {
    /// The payload.
    pub payload: WireConfiguration,
    /// Counts of what the payload contains.
    pub summary: PlanSummary,
}

impl ReplacementPlan {
    fn new(payload: WireConfiguration) -> Self {
        let summary = PlanSummary {
            rules: payload.rules.len(),
            destinations: payload.rules.iter().map(|r| r.destinations.len()).sum(),
            repository_filters: payload
                .rules
                .iter()
                .map(|r| r.repository_filters.len())
                .sum(),
        };
        Self { payload, summary }
    }

    /// Fingerprint of the payload.
    #[must_use]
    pub fn digest(&self) -> String {
        self.payload.digest()
    }
}

/// Builds replacement payloads. Pure, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planner;

impl Planner {
    /// Plans the write that makes the remote configuration equal `desired`.
    ///
    /// # Errors
    ///
    /// Returns every validation failure of `desired`.
    pub fn plan(desired: &ReplicationConfiguration) -> Result<ReplacementPlan, ValidationErrors> {
        to_wire(desired).map(ReplacementPlan::new)
    }

    /// Plans the write that removes all replication.
    #[must_use]
    pub fn plan_delete() -> ReplacementPlan {
        ReplacementPlan::new(WireConfiguration::empty())
    }
}
