//! Lifecycle state of the managed configuration.

use chrono::{DateTime, Utc};
use ecr_replication_core::ReplicationConfiguration;
use serde::{Deserialize, Serialize};

/// Lifecycle state of the managed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Nothing is recorded locally.
    Absent,

    /// The local record matches the last confirmed remote configuration.
    Managed,

    /// A write was attempted but could not be confirmed by a read.
    /// Re-applying the declaration recovers it.
    Tainted,
}

impl ResourceState {
    /// Returns true if a record exists.
    #[must_use]
    pub const fn is_present(self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Returns a string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Managed => "managed",
            Self::Tainted => "tainted",
        }
    }
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Local record of a managed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedRecord {
    /// Registry (account) id the configuration belongs to.
    ///
    /// `None` only for a record tainted before any read succeeded.
    pub id: Option<String>,

    /// Managed or tainted.
    pub state: ResourceState,

    /// Configuration last observed remotely.
    pub last_known: ReplicationConfiguration,

    /// Digest of the last observed wire payload.
    pub digest: String,

    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl ManagedRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(
        id: Option<String>,
        state: ResourceState,
        last_known: ReplicationConfiguration,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            id,
            state,
            last_known,
            digest: digest.into(),
            updated_at: Utc::now(),
        }
    }

    /// Returns true if the record is tainted.
    #[must_use]
    pub fn is_tainted(&self) -> bool {
        self.state == ResourceState::Tainted
    }

    /// Marks the record tainted.
    pub fn taint(&mut self) {
        self.state = ResourceState::Tainted;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(ResourceState::Absent.to_string(), "absent");
        assert_eq!(ResourceState::Managed.to_string(), "managed");
        assert_eq!(ResourceState::Tainted.to_string(), "tainted");
        assert!(!ResourceState::Absent.is_present());
        assert!(ResourceState::Tainted.is_present());
    }

    #[test]
    fn test_taint() {
        let mut record = ManagedRecord::new(
            Some("123456789012".to_string()),
            ResourceState::Managed,
            ReplicationConfiguration::empty(),
            "sha256:00",
        );
        let before = record.updated_at;

        record.taint();

        assert!(record.is_tainted());
        assert!(record.updated_at >= before);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ResourceState::Tainted).unwrap();
        assert_eq!(json, "\"tainted\"");
    }
}
