//! Configuration fixtures.
//!
//! Builders for the declared configurations used throughout the tests.

use ecr_replication_core::{
    to_wire, ReplicationConfiguration, ReplicationDestination, ReplicationRule, RepositoryFilter,
    WireConfiguration,
};

/// Account that owns the mock registry.
pub const ACCOUNT_ID: &str = "123456789012";

/// A second account, for cross-account destinations and identity mismatches.
pub const OTHER_ACCOUNT_ID: &str = "210987654321";

/// One rule replicating to `regions` in [`ACCOUNT_ID`], without filters.
///
/// # Examples
///
/// ```rust
/// use ecr_replication_test::replication_to;
///
/// let config = replication_to(&["us-west-2", "us-east-2"]);
/// assert_eq!(config.destination_count(), 2);
/// ```
#[must_use]
pub fn replication_to(regions: &[&str]) -> ReplicationConfiguration {
    replication_with_filters(regions, &[])
}

/// One rule replicating to `regions` in [`ACCOUNT_ID`], limited to
/// repositories matching the `prefixes`.
#[must_use]
pub fn replication_with_filters(regions: &[&str], prefixes: &[&str]) -> ReplicationConfiguration {
    let rule = regions.iter().fold(ReplicationRule::new(), |rule, region| {
        rule.with_destination(ReplicationDestination::new(*region, ACCOUNT_ID))
    });
    let rule = prefixes
        .iter()
        .fold(rule, |rule, prefix| rule.with_filter(RepositoryFilter::prefix(*prefix)));
    ReplicationConfiguration::with_rule(rule)
}

/// The wire payload of a valid configuration.
///
/// # Panics
///
/// Panics if `config` does not validate.
#[must_use]
pub fn wire(config: &ReplicationConfiguration) -> WireConfiguration {
    match to_wire(config) {
        Ok(wire) => wire,
        Err(errors) => panic!("fixture configuration is invalid: {errors}"),
    }
}
