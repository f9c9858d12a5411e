//! Canonical replication configuration tree.
//!
//! This is the shape callers declare and the shape read-back state is
//! flattened into for drift comparison:
//!
//! ```text
//! ReplicationConfiguration
//! └── rules (at most one)
//!     ├── destinations        (ordered, 1..=25)
//!     └── repository_filters  (ordered, 0..=100)
//! ```

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationError, ValidationErrors};

/// Maximum number of rules the remote API accepts in one configuration.
pub const MAX_RULES: usize = 1;

/// Maximum number of destinations per rule.
pub const MAX_DESTINATIONS_PER_RULE: usize = 25;

/// Maximum number of repository filters per rule.
pub const MAX_FILTERS_PER_RULE: usize = 100;

/// Maximum length of a repository filter pattern.
pub const MAX_FILTER_LENGTH: usize = 256;

static REGION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-[0-9]+$").expect("region pattern is valid")
});

static ACCOUNT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{12}$").expect("account id pattern is valid"));

/// Returns true if `region` looks like a remote region identifier (`us-west-2`).
#[must_use]
pub fn is_region(region: &str) -> bool {
    REGION_PATTERN.is_match(region)
}

/// Returns true if `id` is a 12-digit account / registry identifier.
#[must_use]
pub fn is_account_id(id: &str) -> bool {
    ACCOUNT_ID_PATTERN.is_match(id)
}

pub(crate) fn rule_path(rule: usize) -> String {
    format!("rule[{rule}]")
}

pub(crate) fn destination_path(rule: usize, destination: usize) -> String {
    format!("rule[{rule}].destination[{destination}]")
}

pub(crate) fn filter_path(rule: usize, filter: usize) -> String {
    format!("rule[{rule}].repository_filter[{filter}]")
}

/// The whole replication configuration of one registry.
///
/// A configuration with zero rules is the default state of every registry,
/// and is what a deleted configuration looks like remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplicationConfiguration {
    /// Registry that owns the configuration. Assigned by the remote system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<String>,

    /// Replication rules.
    #[serde(default)]
    pub rules: Vec<ReplicationRule>,
}

impl ReplicationConfiguration {
    /// Creates the empty (default) configuration.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a configuration holding a single rule.
    #[must_use]
    pub fn with_rule(rule: ReplicationRule) -> Self {
        Self {
            registry_id: None,
            rules: vec![rule],
        }
    }

    /// Sets the registry id.
    #[must_use]
    pub fn with_registry_id(mut self, registry_id: impl Into<String>) -> Self {
        self.registry_id = Some(registry_id.into());
        self
    }

    /// Returns true if no replication is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Total number of destinations across all rules.
    #[must_use]
    pub fn destination_count(&self) -> usize {
        self.rules.iter().map(|r| r.destinations.len()).sum()
    }

    /// Total number of repository filters across all rules.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.rules.iter().map(|r| r.repository_filters.len()).sum()
    }
}

impl Validate for ReplicationConfiguration {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.rules.len() > MAX_RULES {
            errors.add(ValidationError::constraint(
                "rule",
                format!(
                    "the registry API accepts at most {MAX_RULES} rule, got {}",
                    self.rules.len()
                ),
            ));
        }

        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate_at(index, &mut errors);
        }

        errors.into_result()
    }
}

/// One replication policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplicationRule {
    /// Where content is replicated to. Order is significant.
    pub destinations: Vec<ReplicationDestination>,

    /// Which repositories are replicated. Empty means all of them.
    #[serde(default)]
    pub repository_filters: Vec<RepositoryFilter>,
}

impl ReplicationRule {
    /// Creates a rule with no destinations and no filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a destination.
    #[must_use]
    pub fn with_destination(mut self, destination: ReplicationDestination) -> Self {
        self.destinations.push(destination);
        self
    }

    /// Appends a repository filter.
    #[must_use]
    pub fn with_filter(mut self, filter: RepositoryFilter) -> Self {
        self.repository_filters.push(filter);
        self
    }

    fn validate_at(&self, index: usize, errors: &mut ValidationErrors) {
        let path = rule_path(index);

        if self.destinations.is_empty() {
            errors.add(ValidationError::empty(format!("{path}.destination")));
        } else if self.destinations.len() > MAX_DESTINATIONS_PER_RULE {
            errors.add(ValidationError::range(
                format!("{path}.destination"),
                format!(
                    "at most {MAX_DESTINATIONS_PER_RULE} destinations are supported, got {}",
                    self.destinations.len()
                ),
            ));
        }

        let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
        for (position, destination) in self.destinations.iter().enumerate() {
            let field = destination_path(index, position);
            destination.validate_at(&field, errors);

            let key = (destination.region.as_str(), destination.registry_id.as_str());
            if let Some(first) = seen.get(&key) {
                errors.add(ValidationError::duplicate(
                    field,
                    format!(
                        "duplicates destination[{first}] ({}, {})",
                        destination.region, destination.registry_id
                    ),
                ));
            } else {
                seen.insert(key, position);
            }
        }

        if self.repository_filters.len() > MAX_FILTERS_PER_RULE {
            errors.add(ValidationError::range(
                format!("{path}.repository_filter"),
                format!(
                    "at most {MAX_FILTERS_PER_RULE} repository filters are supported, got {}",
                    self.repository_filters.len()
                ),
            ));
        }

        let mut seen: HashMap<(&str, RepositoryFilterType), usize> = HashMap::new();
        for (position, filter) in self.repository_filters.iter().enumerate() {
            let field = filter_path(index, position);
            filter.validate_at(&field, errors);

            let key = (filter.filter.as_str(), filter.filter_type);
            if let Some(first) = seen.get(&key) {
                errors.add(ValidationError::duplicate(
                    field,
                    format!("duplicates repository_filter[{first}] ({})", filter.filter),
                ));
            } else {
                seen.insert(key, position);
            }
        }
    }
}

/// A (region, account) pair that receives replicated content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplicationDestination {
    /// Destination region, e.g. `us-west-2`.
    pub region: String,

    /// Account owning the destination registry.
    pub registry_id: String,
}

impl ReplicationDestination {
    /// Creates a destination.
    #[must_use]
    pub fn new(region: impl Into<String>, registry_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            registry_id: registry_id.into(),
        }
    }

    fn validate_at(&self, field: &str, errors: &mut ValidationErrors) {
        if self.region.is_empty() {
            errors.add(ValidationError::empty(format!("{field}.region")));
        } else if !is_region(&self.region) {
            errors.add(ValidationError::format(
                format!("{field}.region"),
                format!("'{}' is not a valid region", self.region),
            ));
        }

        if self.registry_id.is_empty() {
            errors.add(ValidationError::empty(format!("{field}.registry_id")));
        } else if !is_account_id(&self.registry_id) {
            errors.add(ValidationError::format(
                format!("{field}.registry_id"),
                format!("'{}' must be a 12-digit account id", self.registry_id),
            ));
        }
    }
}

impl fmt::Display for ReplicationDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.registry_id)
    }
}

/// Restricts which repositories a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryFilter {
    /// Repository name pattern.
    pub filter: String,

    /// How `filter` is matched.
    #[serde(default)]
    pub filter_type: RepositoryFilterType,
}

impl RepositoryFilter {
    /// Creates a prefix-match filter.
    #[must_use]
    pub fn prefix(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            filter_type: RepositoryFilterType::PrefixMatch,
        }
    }

    fn validate_at(&self, field: &str, errors: &mut ValidationErrors) {
        if self.filter.is_empty() {
            errors.add(ValidationError::empty(format!("{field}.filter")));
        } else if self.filter.chars().count() > MAX_FILTER_LENGTH {
            errors.add(ValidationError::range(
                format!("{field}.filter"),
                format!("filter must be at most {MAX_FILTER_LENGTH} characters"),
            ));
        }
    }
}

/// Supported repository filter match types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepositoryFilterType {
    /// Repository name starts with the filter.
    #[default]
    #[serde(rename = "PREFIX_MATCH")]
    PrefixMatch,
}

impl RepositoryFilterType {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrefixMatch => "PREFIX_MATCH",
        }
    }

    /// Parses the wire representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PREFIX_MATCH" => Some(Self::PrefixMatch),
            _ => None,
        }
    }
}

impl fmt::Display for RepositoryFilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
