//! Wire representation exchanged with the registry API.
//!
//! Field names follow the API's JSON encoding (`registryId`,
//! `repositoryFilters`, `filterType`). Collections the API omits or sends as
//! `null` deserialize as empty.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A replication configuration as sent to and received from the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireConfiguration {
    /// Replication rules.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rules: Vec<WireRule>,
}

impl WireConfiguration {
    /// The payload that resets a registry to "no replication".
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the payload carries no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns a `sha256:<hex>` fingerprint of the JSON encoding.
    ///
    /// Two payloads with the same rules, destinations and filters in the same
    /// order produce the same digest.
    #[must_use]
    pub fn digest(&self) -> String {
        // Serializing plain structs of strings cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

/// A rule on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRule {
    /// Destinations in API order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub destinations: Vec<WireDestination>,

    /// Repository filters in API order.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub repository_filters: Vec<WireRepositoryFilter>,
}

/// A destination on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDestination {
    /// Destination region.
    #[serde(default)]
    pub region: String,

    /// Destination account.
    #[serde(default)]
    pub registry_id: String,
}

/// A repository filter on the wire.
///
/// `filter_type` stays a string here: an unknown value is a contract break
/// reported by the normalizer, not a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRepositoryFilter {
    /// Repository name pattern.
    #[serde(default)]
    pub filter: String,

    /// Match type, currently only `PREFIX_MATCH`.
    #[serde(default)]
    pub filter_type: String,
}

/// Response of the registry description call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRegistry {
    /// Registry (account) the configuration belongs to.
    #[serde(default)]
    pub registry_id: Option<String>,

    /// Current replication configuration. Absent means none configured.
    #[serde(default)]
    pub replication_configuration: Option<WireConfiguration>,
}

impl WireRegistry {
    /// Creates a registry description.
    #[must_use]
    pub fn new(registry_id: impl Into<String>, configuration: WireConfiguration) -> Self {
        Self {
            registry_id: Some(registry_id.into()),
            replication_configuration: Some(configuration),
        }
    }

    /// Returns the configuration, treating an absent one as empty.
    #[must_use]
    pub fn configuration(&self) -> WireConfiguration {
        self.replication_configuration.clone().unwrap_or_default()
    }
}

/// Request body of the configuration write call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutReplicationConfigurationRequest {
    /// The complete replacement configuration.
    pub replication_configuration: WireConfiguration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_response() {
        let json = r#"{
            "registryId": "123456789012",
            "replicationConfiguration": {
                "rules": [{
                    "destinations": [
                        {"region": "us-west-2", "registryId": "123456789012"},
                        {"region": "us-east-2", "registryId": "123456789012"}
                    ],
                    "repositoryFilters": [
                        {"filter": "custom-filter1", "filterType": "PREFIX_MATCH"}
                    ]
                }]
            }
        }"#;

        let registry: WireRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(registry.registry_id.as_deref(), Some("123456789012"));
        let config = registry.configuration();
        assert_eq!(config.rules[0].destinations[1].region, "us-east-2");
        assert_eq!(config.rules[0].repository_filters[0].filter_type, "PREFIX_MATCH");
    }

    #[test]
    fn test_null_collections_are_empty() {
        let registry: WireRegistry = serde_json::from_str(
            r#"{"registryId": "123456789012", "replicationConfiguration": {"rules": null}}"#,
        )
        .unwrap();
        assert!(registry.configuration().is_empty());

        let registry: WireRegistry = serde_json::from_str(r#"{"registryId": "1"}"#).unwrap();
        assert!(registry.configuration().is_empty());
    }

    #[test]
    fn test_serialize_uses_api_field_names() {
        let config = WireConfiguration {
            rules: vec![WireRule {
                destinations: vec![WireDestination {
                    region: "us-west-2".to_string(),
                    registry_id: "123456789012".to_string(),
                }],
                repository_filters: Vec::new(),
            }],
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(
            json,
            r#"{"rules":[{"destinations":[{"region":"us-west-2","registryId":"123456789012"}]}]}"#
        );
    }

    #[test]
    fn test_digest_is_order_sensitive() {
        let destination = |region: &str| WireDestination {
            region: region.to_string(),
            registry_id: "123456789012".to_string(),
        };
        let a = WireConfiguration {
            rules: vec![WireRule {
                destinations: vec![destination("us-west-2"), destination("us-east-2")],
                repository_filters: Vec::new(),
            }],
        };
        let mut b = a.clone();
        b.rules[0].destinations.reverse();

        assert!(a.digest().starts_with("sha256:"));
        assert_eq!(a.digest(), a.clone().digest());
        assert_ne!(a.digest(), b.digest());
    }
}
