//! Assertion helpers.

use ecr_replication_core::{compare, from_wire, ReplicationConfiguration};

use crate::mock_registry::MockRegistry;

/// Asserts that `actual` satisfies `declared`.
///
/// # Panics
///
/// Panics with the drift report if any path differs.
#[track_caller]
pub fn assert_no_drift(declared: &ReplicationConfiguration, actual: &ReplicationConfiguration) {
    let report = compare(declared, actual);
    assert!(report.is_empty(), "expected no drift, found {report}");
}

/// Asserts that the configuration stored in `registry` satisfies `declared`.
///
/// # Panics
///
/// Panics if the stored configuration is malformed or drifts from `declared`.
#[track_caller]
pub fn assert_remote_matches(registry: &MockRegistry, declared: &ReplicationConfiguration) {
    let stored = match from_wire(Some(registry.registry_id()), &registry.stored()) {
        Ok(stored) => stored,
        Err(err) => panic!("stored configuration is malformed: {err}"),
    };
    assert_no_drift(declared, &stored);
}

/// Asserts that nothing was sent to `registry`.
///
/// # Panics
///
/// Panics if any read or write was attempted.
#[track_caller]
pub fn assert_untouched(registry: &MockRegistry) {
    assert_eq!(
        registry.call_count(),
        0,
        "expected no remote calls, found {} read(s) and {} write(s)",
        registry.read_count(),
        registry.write_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{replication_to, wire};

    #[test]
    fn test_matching_remote() {
        let declared = replication_to(&["us-west-2"]);
        let registry = MockRegistry::new().with_configuration(wire(&declared));
        assert_remote_matches(&registry, &declared);
        assert_untouched(&registry);
    }

    #[test]
    #[should_panic(expected = "expected no drift")]
    fn test_drifted_remote_panics() {
        let registry =
            MockRegistry::new().with_configuration(wire(&replication_to(&["eu-west-1"])));
        assert_remote_matches(&registry, &replication_to(&["us-west-2"]));
    }
}
