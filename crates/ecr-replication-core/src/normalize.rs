//! Conversion between the canonical tree and the wire representation.
//!
//! `to_wire` refuses to encode anything that fails validation, so an invalid
//! declaration never reaches the remote API. `from_wire` keeps destination
//! and filter order exactly as the API returned it.

use crate::error::SchemaError;
use crate::model::{
    destination_path, filter_path, rule_path, ReplicationConfiguration, ReplicationDestination,
    ReplicationRule, RepositoryFilter, RepositoryFilterType,
};
use crate::validation::{Validate, ValidationErrors};
use crate::wire::{WireConfiguration, WireDestination, WireRepositoryFilter, WireRule};

/// Encodes a declared configuration for the remote API.
///
/// # Errors
///
/// Returns every validation failure of `config`; nothing is encoded then.
///
/// # Examples
///
/// ```
/// use ecr_replication_core::{to_wire, ReplicationConfiguration, ReplicationDestination, ReplicationRule};
///
/// let config = ReplicationConfiguration::with_rule(
///     ReplicationRule::new().with_destination(ReplicationDestination::new("us-west-2", "123456789012")),
/// );
/// let wire = to_wire(&config)?;
/// assert_eq!(wire.rules[0].destinations[0].region, "us-west-2");
/// # Ok::<(), ecr_replication_core::ValidationErrors>(())
/// ```
pub fn to_wire(config: &ReplicationConfiguration) -> Result<WireConfiguration, ValidationErrors> {
    config.validate()?;

    Ok(WireConfiguration {
        rules: config.rules.iter().map(rule_to_wire).collect(),
    })
}

fn rule_to_wire(rule: &ReplicationRule) -> WireRule {
    WireRule {
        destinations: rule
            .destinations
            .iter()
            .map(|d| WireDestination {
                region: d.region.clone(),
                registry_id: d.registry_id.clone(),
            })
            .collect(),
        repository_filters: rule
            .repository_filters
            .iter()
            .map(|f| WireRepositoryFilter {
                filter: f.filter.clone(),
                filter_type: f.filter_type.as_str().to_string(),
            })
            .collect(),
    }
}

/// Flattens a wire configuration into the canonical tree.
///
/// `registry_id` is the owning registry reported alongside the configuration.
///
/// # Errors
///
/// Returns a [`SchemaError`] naming the first element that breaks the API
/// contract: a rule without destinations, an empty region, registry id or
/// filter, or an unknown filter type.
pub fn from_wire(
    registry_id: Option<&str>,
    wire: &WireConfiguration,
) -> Result<ReplicationConfiguration, SchemaError> {
    let rules = wire
        .rules
        .iter()
        .enumerate()
        .map(|(index, rule)| rule_from_wire(index, rule))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReplicationConfiguration {
        registry_id: registry_id.map(ToString::to_string),
        rules,
    })
}

fn rule_from_wire(index: usize, rule: &WireRule) -> Result<ReplicationRule, SchemaError> {
    if rule.destinations.is_empty() {
        return Err(SchemaError::new(
            format!("{}.destination", rule_path(index)),
            "rule has no destinations",
        ));
    }

    let destinations = rule
        .destinations
        .iter()
        .enumerate()
        .map(|(position, d)| {
            let path = destination_path(index, position);
            if d.region.is_empty() {
                return Err(SchemaError::new(format!("{path}.region"), "missing region"));
            }
            if d.registry_id.is_empty() {
                return Err(SchemaError::new(
                    format!("{path}.registry_id"),
                    "missing registry id",
                ));
            }
            Ok(ReplicationDestination::new(&d.region, &d.registry_id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let repository_filters = rule
        .repository_filters
        .iter()
        .enumerate()
        .map(|(position, f)| {
            let path = filter_path(index, position);
            if f.filter.is_empty() {
                return Err(SchemaError::new(format!("{path}.filter"), "missing filter"));
            }
            let filter_type = RepositoryFilterType::parse(&f.filter_type).ok_or_else(|| {
                SchemaError::new(
                    format!("{path}.filter_type"),
                    format!("unsupported filter type '{}'", f.filter_type),
                )
            })?;
            Ok(RepositoryFilter {
                filter: f.filter.clone(),
                filter_type,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReplicationRule {
        destinations,
        repository_filters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "123456789012";

    fn declared() -> ReplicationConfiguration {
        ReplicationConfiguration::with_rule(
            ReplicationRule::new()
                .with_destination(ReplicationDestination::new("us-west-2", ACCOUNT))
                .with_destination(ReplicationDestination::new("us-east-2", ACCOUNT))
                .with_filter(RepositoryFilter::prefix("custom-filter1"))
                .with_filter(RepositoryFilter::prefix("custom-filter2")),
        )
    }

    #[test]
    fn test_to_wire_preserves_order() {
        let wire = to_wire(&declared()).unwrap();
        let regions: Vec<_> = wire.rules[0]
            .destinations
            .iter()
            .map(|d| d.region.as_str())
            .collect();
        assert_eq!(regions, vec!["us-west-2", "us-east-2"]);
        assert_eq!(wire.rules[0].repository_filters[1].filter, "custom-filter2");
        assert_eq!(wire.rules[0].repository_filters[1].filter_type, "PREFIX_MATCH");
    }

    #[test]
    fn test_round_trip() {
        let config = declared();
        let wire = to_wire(&config).unwrap();
        assert_eq!(from_wire(None, &wire).unwrap(), config);
    }

    #[test]
    fn test_to_wire_rejects_duplicate_destination() {
        let config = ReplicationConfiguration::with_rule(
            ReplicationRule::new()
                .with_destination(ReplicationDestination::new("us-east-1", "111111111111"))
                .with_destination(ReplicationDestination::new("us-east-1", "111111111111")),
        );
        assert!(to_wire(&config).is_err());
    }

    #[test]
    fn test_from_wire_empty() {
        let config = from_wire(Some(ACCOUNT), &WireConfiguration::empty()).unwrap();
        assert!(config.is_empty());
        assert_eq!(config.registry_id.as_deref(), Some(ACCOUNT));
    }

    #[test]
    fn test_from_wire_rejects_unknown_filter_type() {
        let mut wire = to_wire(&declared()).unwrap();
        wire.rules[0].repository_filters[1].filter_type = "SUFFIX_MATCH".to_string();

        let err = from_wire(None, &wire).unwrap_err();
        assert_eq!(err.path, "rule[0].repository_filter[1].filter_type");
        assert!(err.reason.contains("SUFFIX_MATCH"));
    }

    #[test]
    fn test_from_wire_rejects_rule_without_destinations() {
        let wire = WireConfiguration {
            rules: vec![WireRule::default()],
        };
        let err = from_wire(None, &wire).unwrap_err();
        assert_eq!(err.path, "rule[0].destination");
    }

    #[test]
    fn test_from_wire_rejects_missing_region() {
        let mut wire = to_wire(&declared()).unwrap();
        wire.rules[0].destinations[0].region.clear();
        let err = from_wire(None, &wire).unwrap_err();
        assert_eq!(err.path, "rule[0].destination[0].region");
    }
}
