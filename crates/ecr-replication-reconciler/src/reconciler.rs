//! The reconciliation state machine.
//!
//! The registry's replication configuration is a singleton: it always
//! exists remotely, create and update are the same full-replacement write,
//! and delete writes the empty configuration. Every write is followed by a
//! separate read whose result is compared against the declaration; the
//! write call's own response is never trusted.
//!
//! ```text
//!            create / import            delete
//!   Absent ──────────────────► Managed ─────────► Absent
//!                               │  ▲
//!          unconfirmed write    │  │ update / apply
//!                               ▼  │
//!                              Tainted
//! ```

use std::future::Future;

use ecr_replication_client::{ClientError, RemoteClient};
use ecr_replication_core::{
    compare, from_wire, is_account_id, DriftReport, Planner, ReplacementPlan,
    ReplicationConfiguration, SchemaError, WireRegistry,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{Operation, ReconcileError, Result};
use crate::state::{ManagedRecord, ResourceState};

/// A remote read, normalized.
struct Observation {
    id: String,
    configuration: ReplicationConfiguration,
    digest: String,
}

/// Reconciles one registry's replication configuration.
///
/// Methods take `&mut self`: at most one operation is in flight per
/// reconciler, and no internal locking is done.
///
/// # Examples
///
/// ```rust
/// use ecr_replication_reconciler::{Reconciler, ResourceState};
/// use ecr_replication_test::{replication_to, MockRegistry};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut reconciler = Reconciler::new(MockRegistry::new());
///
/// reconciler.create(&replication_to(&["us-west-2"])).await.unwrap();
/// assert_eq!(reconciler.state(), ResourceState::Managed);
///
/// reconciler.delete().await.unwrap();
/// assert_eq!(reconciler.state(), ResourceState::Absent);
/// # });
/// ```
#[derive(Debug)]
pub struct Reconciler<C> {
    client: C,
    record: Option<ManagedRecord>,
    cancellation: CancellationToken,
}

impl<C: RemoteClient> Reconciler<C> {
    /// Creates a reconciler with nothing recorded.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            record: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Starts from a previously persisted record.
    #[must_use]
    pub fn with_record(mut self, record: Option<ManagedRecord>) -> Self {
        self.record = record;
        self
    }

    /// Aborts in-flight remote calls when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ResourceState {
        self.record
            .as_ref()
            .map_or(ResourceState::Absent, |record| record.state)
    }

    /// Returns the local record, if any.
    #[must_use]
    pub const fn record(&self) -> Option<&ManagedRecord> {
        self.record.as_ref()
    }

    /// Returns the remote client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Consumes the reconciler, returning its record.
    #[must_use]
    pub fn into_record(self) -> Option<ManagedRecord> {
        self.record
    }

    /// Writes `desired` for the first time.
    ///
    /// On a remote failure before the write lands, the state stays
    /// [`ResourceState::Absent`].
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::InvalidState`] if a record already exists
    /// - [`ReconcileError::Validation`] if `desired` is invalid; nothing is sent
    /// - [`ReconcileError::DriftMismatch`] if the confirming read disagrees
    /// - transient, remote, schema and cancellation errors from the remote calls
    pub async fn create(&mut self, desired: &ReplicationConfiguration) -> Result<ManagedRecord> {
        let operation = Operation::Create;
        self.require(operation, |state| state == ResourceState::Absent)?;
        let plan = plan(operation, desired)?;
        self.replace(operation, desired, &plan)
            .instrument(operation_span(operation))
            .await
    }

    /// Replaces the managed configuration with `desired`.
    ///
    /// Updating a tainted record re-reconciles it. Repeating an update with
    /// the same declaration is harmless.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create), with [`ReconcileError::InvalidState`]
    /// when nothing is recorded.
    pub async fn update(&mut self, desired: &ReplicationConfiguration) -> Result<ManagedRecord> {
        let operation = Operation::Update;
        self.require(operation, ResourceState::is_present)?;
        let plan = plan(operation, desired)?;
        self.replace(operation, desired, &plan)
            .instrument(operation_span(operation))
            .await
    }

    /// Creates when nothing is recorded, updates otherwise.
    ///
    /// # Errors
    ///
    /// See [`create`](Self::create) and [`update`](Self::update).
    pub async fn apply(&mut self, desired: &ReplicationConfiguration) -> Result<ManagedRecord> {
        if self.state().is_present() {
            self.update(desired).await
        } else {
            self.create(desired).await
        }
    }

    /// Resets the remote configuration to empty and forgets the record.
    ///
    /// Deleting when nothing is recorded succeeds without a remote call.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::DriftMismatch`] if the confirming read is not empty
    /// - transient, remote, schema and cancellation errors from the remote calls
    pub async fn delete(&mut self) -> Result<()> {
        let operation = Operation::Delete;
        if !self.state().is_present() {
            debug!(%operation, "nothing recorded, delete is a no-op");
            return Ok(());
        }

        let plan = Planner::plan_delete();
        self.replace(operation, &ReplicationConfiguration::empty(), &plan)
            .instrument(operation_span(operation))
            .await?;
        self.record = None;
        info!(%operation, state = %ResourceState::Absent, "replication configuration reset");
        Ok(())
    }

    /// Reads and normalizes the remote configuration.
    ///
    /// The local record is neither required nor changed.
    ///
    /// # Errors
    ///
    /// Transient, remote, schema and cancellation errors from the read.
    pub async fn read(&self) -> Result<ReplicationConfiguration> {
        let operation = Operation::Read;
        let observation = self
            .observe(operation)
            .instrument(operation_span(operation))
            .await?;
        debug!(%operation, digest = %observation.digest, "read replication configuration");
        Ok(observation.configuration)
    }

    /// Compares the remote configuration with the last known one.
    ///
    /// The record is updated to what was observed and the differences
    /// are returned; an empty report means nothing changed remotely.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::InvalidState`] when nothing is recorded, plus
    /// errors from the read.
    pub async fn refresh(&mut self) -> Result<DriftReport> {
        let operation = Operation::Refresh;
        self.require(operation, ResourceState::is_present)?;
        let observation = self
            .observe(operation)
            .instrument(operation_span(operation))
            .await?;

        let Some(record) = self.record.as_mut() else {
            return Err(ReconcileError::InvalidState {
                operation,
                state: ResourceState::Absent,
            });
        };

        let report = compare(&record.last_known, &observation.configuration);
        if report.is_empty() {
            debug!(%operation, "no remote changes");
        } else {
            warn!(%operation, differences = report.len(), %report, "remote configuration changed");
        }

        *record = ManagedRecord::new(
            Some(observation.id),
            record.state,
            observation.configuration,
            observation.digest,
        );
        Ok(report)
    }

    /// Takes over management of the existing remote configuration.
    ///
    /// `identifier` is the registry id. Nothing is written; an empty remote
    /// configuration imports fine.
    ///
    /// # Errors
    ///
    /// - [`ReconcileError::InvalidIdentifier`] if `identifier` is not 12 digits
    /// - [`ReconcileError::InvalidState`] if a record already exists
    /// - [`ReconcileError::IdentityMismatch`] if the remote registry differs
    /// - errors from the read
    pub async fn import(&mut self, identifier: &str) -> Result<ManagedRecord> {
        let operation = Operation::Import;
        if !is_account_id(identifier) {
            return Err(ReconcileError::InvalidIdentifier {
                identifier: identifier.to_string(),
            });
        }
        self.require(operation, |state| state == ResourceState::Absent)?;

        let registry = self
            .call(operation, self.client.read_configuration())
            .instrument(operation_span(operation))
            .await?;
        let observation = normalize(operation, Some(identifier), &registry)?;

        let record = ManagedRecord::new(
            Some(observation.id),
            ResourceState::Managed,
            observation.configuration,
            observation.digest,
        );
        info!(
            %operation,
            registry_id = identifier,
            rules = record.last_known.rules.len(),
            destinations = record.last_known.destination_count(),
            state = %record.state,
            "imported replication configuration"
        );
        self.record = Some(record.clone());
        Ok(record)
    }

    /// Writes `plan`, reads back, and confirms against `declared`.
    async fn replace(
        &mut self,
        operation: Operation,
        declared: &ReplicationConfiguration,
        plan: &ReplacementPlan,
    ) -> Result<ManagedRecord> {
        debug!(digest = %plan.digest(), summary = %plan.summary, "planned replacement");

        // Nothing has been sent yet, so the state is unchanged.
        if self.cancellation.is_cancelled() {
            debug!("cancelled before write");
            return Err(ReconcileError::Cancelled { operation });
        }

        let written = self
            .call(operation, self.client.write_configuration(&plan.payload))
            .await;
        if let Err(err) = written {
            // A cancelled write may still have landed.
            if err.is_cancelled() {
                self.taint(operation);
            }
            return Err(err);
        }
        info!(summary = %plan.summary, "replication configuration written");

        let observed = self.observe(operation).await;
        let observation = match observed {
            Ok(observation) => observation,
            Err(err) => {
                self.taint(operation);
                return Err(err);
            }
        };

        let report = compare(declared, &observation.configuration);
        let state = if report.is_empty() {
            ResourceState::Managed
        } else {
            ResourceState::Tainted
        };

        let record = ManagedRecord::new(
            Some(observation.id),
            state,
            observation.configuration,
            observation.digest,
        );
        self.record = Some(record.clone());

        if !report.is_empty() {
            warn!(
                differences = report.len(),
                %report,
                state = %state,
                "confirming read does not match declaration"
            );
            return Err(ReconcileError::DriftMismatch { operation, report });
        }

        info!(
            registry_id = record.id.as_deref().unwrap_or_default(),
            rules = record.last_known.rules.len(),
            destinations = record.last_known.destination_count(),
            state = %state,
            "replication configuration confirmed"
        );
        Ok(record)
    }

    /// Reads the remote configuration, checking it belongs to the recorded registry.
    async fn observe(&self, operation: Operation) -> Result<Observation> {
        let registry = self.call(operation, self.client.read_configuration()).await?;
        let expected = self.record.as_ref().and_then(|record| record.id.as_deref());
        normalize(operation, expected, &registry)
    }

    /// Races `call` against cancellation.
    async fn call<T>(
        &self,
        operation: Operation,
        call: impl Future<Output = std::result::Result<T, ClientError>> + Send,
    ) -> Result<T> {
        if self.cancellation.is_cancelled() {
            return Err(ReconcileError::Cancelled { operation });
        }

        tokio::select! {
            biased;
            () = self.cancellation.cancelled() => {
                warn!("remote call cancelled");
                Err(ReconcileError::Cancelled { operation })
            }
            result = call => result.map_err(|err| ReconcileError::from_client(operation, err)),
        }
    }

    fn require(&self, operation: Operation, allowed: impl Fn(ResourceState) -> bool) -> Result<()> {
        let state = self.state();
        if allowed(state) {
            Ok(())
        } else {
            Err(ReconcileError::InvalidState { operation, state })
        }
    }

    /// Marks the outcome of a write unknown.
    fn taint(&mut self, operation: Operation) {
        let record = self.record.get_or_insert_with(|| {
            ManagedRecord::new(
                None,
                ResourceState::Tainted,
                ReplicationConfiguration::empty(),
                String::new(),
            )
        });
        record.taint();
        warn!(%operation, state = %record.state, "write could not be confirmed");
    }
}

fn operation_span(operation: Operation) -> tracing::Span {
    info_span!(
        "reconcile",
        operation = operation.as_str(),
        operation_id = %Uuid::now_v7()
    )
}

fn plan(operation: Operation, desired: &ReplicationConfiguration) -> Result<ReplacementPlan> {
    Planner::plan(desired).map_err(|errors| {
        warn!(errors = errors.len(), "declared configuration is invalid");
        ReconcileError::Validation { operation, errors }
    })
}

/// Resolves the registry identity and normalizes the configuration.
fn normalize(
    operation: Operation,
    expected: Option<&str>,
    registry: &WireRegistry,
) -> Result<Observation> {
    let id = match (registry.registry_id.as_deref(), expected) {
        (Some(actual), Some(expected)) if actual != expected => {
            return Err(ReconcileError::IdentityMismatch {
                operation,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        (Some(id), _) | (None, Some(id)) => id.to_string(),
        (None, None) => {
            return Err(ReconcileError::Schema {
                operation,
                source: SchemaError::new("registryId", "registry description has no registry id"),
            });
        }
    };

    let wire = registry.configuration();
    let configuration = from_wire(Some(&id), &wire)
        .map_err(|source| ReconcileError::Schema { operation, source })?;

    Ok(Observation {
        id,
        configuration,
        digest: wire.digest(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecr_replication_core::{
        ReplicationDestination, WireConfiguration, WireDestination, WireRepositoryFilter, WireRule,
    };
    use ecr_replication_test::{
        assert_remote_matches, assert_untouched, replication_to, replication_with_filters, wire,
        MockRegistry, ACCOUNT_ID, OTHER_ACCOUNT_ID,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn reconciler() -> Reconciler<Arc<MockRegistry>> {
        Reconciler::new(Arc::new(MockRegistry::new()))
    }

    #[tokio::test]
    async fn test_create() {
        let mut reconciler = reconciler();
        let desired = replication_to(&["us-west-2"]);

        let record = reconciler.create(&desired).await.unwrap();

        assert_eq!(record.state, ResourceState::Managed);
        assert_eq!(record.id.as_deref(), Some(ACCOUNT_ID));
        assert_eq!(record.last_known.registry_id.as_deref(), Some(ACCOUNT_ID));
        assert_eq!(reconciler.state(), ResourceState::Managed);
        assert_remote_matches(reconciler.client(), &desired);
        assert_eq!(reconciler.client().write_count(), 1);
        assert_eq!(reconciler.client().read_count(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_absent() {
        let mut reconciler = reconciler();
        reconciler.create(&replication_to(&["us-west-2"])).await.unwrap();

        let err = reconciler
            .create(&replication_to(&["eu-west-1"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::InvalidState {
                operation: Operation::Create,
                state: ResourceState::Managed
            }
        ));
        assert_eq!(reconciler.client().write_count(), 1);
    }

    #[tokio::test]
    async fn test_create_remote_failure_stays_absent() {
        let mut reconciler = reconciler();
        reconciler
            .client()
            .fail_next_write(ClientError::not_authorized("denied"));

        let err = reconciler
            .create(&replication_to(&["us-west-2"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Remote { .. }));
        assert_eq!(err.operation(), Some(Operation::Create));
        assert_eq!(reconciler.state(), ResourceState::Absent);
        assert_eq!(reconciler.client().read_count(), 0);
    }

    #[tokio::test]
    async fn test_throttled_write_is_transient() {
        let mut reconciler = reconciler();
        let throttled = ClientError::throttled("Rate exceeded").with_code("ThrottlingException");
        reconciler.client().fail_next_write(throttled);

        let err = reconciler
            .create(&replication_to(&["us-west-2"]))
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(reconciler.state(), ResourceState::Absent);
        assert_eq!(reconciler.client().write_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_declaration_sends_nothing() {
        let mut reconciler = reconciler();
        let duplicate = ReplicationConfiguration::with_rule(
            replication_to(&["us-west-2"]).rules[0]
                .clone()
                .with_destination(ReplicationDestination::new("us-west-2", ACCOUNT_ID)),
        );

        let err = reconciler.create(&duplicate).await.unwrap_err();

        assert!(matches!(err, ReconcileError::Validation { .. }));
        assert_untouched(reconciler.client());
        assert_eq!(reconciler.state(), ResourceState::Absent);
    }

    #[tokio::test]
    async fn test_update_requires_record() {
        let mut reconciler = reconciler();

        let err = reconciler
            .update(&replication_to(&["us-west-2"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::InvalidState { .. }));
        assert_untouched(reconciler.client());
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let mut reconciler = reconciler();
        let desired = replication_with_filters(&["us-west-2", "us-east-2"], &["prod-"]);
        reconciler.create(&desired).await.unwrap();

        let first = reconciler.update(&desired).await.unwrap();
        let second = reconciler.update(&desired).await.unwrap();

        assert_eq!(first.last_known, second.last_known);
        assert_eq!(first.digest, second.digest);
        assert_eq!(reconciler.client().writes()[1], reconciler.client().writes()[2]);
        assert_remote_matches(reconciler.client(), &desired);
    }

    #[tokio::test]
    async fn test_apply_dispatches() {
        let mut reconciler = reconciler();

        reconciler.apply(&replication_to(&["us-west-2"])).await.unwrap();
        assert_eq!(reconciler.state(), ResourceState::Managed);

        let desired = replication_to(&["us-west-2", "us-east-2"]);
        reconciler.apply(&desired).await.unwrap();
        assert_remote_matches(reconciler.client(), &desired);
    }

    #[tokio::test]
    async fn test_stale_read_taints_then_recovers() {
        let mut reconciler = reconciler();
        let desired = replication_to(&["us-west-2"]);
        reconciler.client().stale_reads(1);

        let err = reconciler.create(&desired).await.unwrap_err();

        let ReconcileError::DriftMismatch { operation, report } = &err else {
            panic!("expected drift mismatch, got {err}");
        };
        assert_eq!(*operation, Operation::Create);
        assert!(report.get("rule[0]").is_some());
        assert!(err.is_retryable());
        assert_eq!(reconciler.state(), ResourceState::Tainted);

        reconciler.update(&desired).await.unwrap();
        assert_eq!(reconciler.state(), ResourceState::Managed);
    }

    #[tokio::test]
    async fn test_failed_confirming_read_taints() {
        let mut reconciler = reconciler();
        reconciler
            .client()
            .fail_next_read(ClientError::network("connection reset"));

        let err = reconciler
            .create(&replication_to(&["us-west-2"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Transient { .. }));
        assert_eq!(reconciler.state(), ResourceState::Tainted);
        assert!(reconciler.record().unwrap().id.is_none());

        reconciler
            .apply(&replication_to(&["us-west-2"]))
            .await
            .unwrap();
        assert_eq!(reconciler.record().unwrap().id.as_deref(), Some(ACCOUNT_ID));
    }

    #[tokio::test]
    async fn test_malformed_confirming_read_is_schema_error() {
        let mut reconciler = reconciler();
        reconciler.client().override_reads(WireRegistry::new(
            ACCOUNT_ID,
            WireConfiguration {
                rules: vec![WireRule {
                    destinations: vec![WireDestination {
                        region: "us-west-2".to_string(),
                        registry_id: ACCOUNT_ID.to_string(),
                    }],
                    repository_filters: vec![WireRepositoryFilter {
                        filter: "prod".to_string(),
                        filter_type: "SUFFIX_MATCH".to_string(),
                    }],
                }],
            },
        ));

        let err = reconciler
            .create(&replication_to(&["us-west-2"]))
            .await
            .unwrap_err();

        let ReconcileError::Schema { source, .. } = &err else {
            panic!("expected schema error, got {err}");
        };
        assert_eq!(source.path, "rule[0].repository_filter[0].filter_type");
        assert!(!err.is_retryable());
        assert_eq!(reconciler.state(), ResourceState::Tainted);
    }

    #[tokio::test]
    async fn test_delete() {
        let mut reconciler = reconciler();
        reconciler.create(&replication_to(&["us-west-2"])).await.unwrap();

        reconciler.delete().await.unwrap();

        assert_eq!(reconciler.state(), ResourceState::Absent);
        assert!(reconciler.client().stored().is_empty());
        assert!(reconciler.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let mut reconciler = reconciler();

        reconciler.delete().await.unwrap();
        reconciler.delete().await.unwrap();

        assert_untouched(reconciler.client());
    }

    #[tokio::test]
    async fn test_delete_unconfirmed_taints() {
        let mut reconciler = reconciler();
        reconciler.create(&replication_to(&["us-west-2"])).await.unwrap();
        reconciler.client().stale_reads(1);

        let err = reconciler.delete().await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::DriftMismatch {
                operation: Operation::Delete,
                ..
            }
        ));
        assert_eq!(reconciler.state(), ResourceState::Tainted);

        reconciler.delete().await.unwrap();
        assert_eq!(reconciler.state(), ResourceState::Absent);
    }

    #[tokio::test]
    async fn test_read_does_not_touch_record() {
        let registry =
            MockRegistry::new().with_configuration(wire(&replication_to(&["eu-west-1"])));
        let reconciler = Reconciler::new(registry);

        let config = reconciler.read().await.unwrap();

        assert_eq!(config.destination_count(), 1);
        assert_eq!(config.registry_id.as_deref(), Some(ACCOUNT_ID));
        assert_eq!(reconciler.state(), ResourceState::Absent);
    }

    #[tokio::test]
    async fn test_read_errors_carry_operation() {
        let reconciler = reconciler();
        reconciler
            .client()
            .fail_next_read(ClientError::malformed("unexpected token"));

        let err = reconciler.read().await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Schema {
                operation: Operation::Read,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_read_is_transient() {
        let reconciler = reconciler();
        reconciler
            .client()
            .fail_next_read(ClientError::not_authorized("AccessDeniedException"));

        let err = reconciler.read().await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Transient {
                operation: Operation::Read,
                ..
            }
        ));
        assert!(err.is_retryable());
        assert_eq!(reconciler.state(), ResourceState::Absent);
    }

    #[tokio::test]
    async fn test_refresh_detects_remote_change() {
        let mut reconciler = reconciler();
        reconciler.create(&replication_to(&["us-west-2"])).await.unwrap();
        assert!(reconciler.refresh().await.unwrap().is_empty());

        reconciler
            .client()
            .modify_remotely(wire(&replication_to(&["eu-central-1"])));
        let report = reconciler.refresh().await.unwrap();

        let region = report.get("rule[0].destination[0].region").unwrap();
        assert_eq!(region.declared.as_deref(), Some("us-west-2"));
        assert_eq!(region.actual.as_deref(), Some("eu-central-1"));
        assert_eq!(
            reconciler.record().unwrap().last_known.rules[0].destinations[0].region,
            "eu-central-1"
        );
        assert_eq!(reconciler.state(), ResourceState::Managed);
    }

    #[tokio::test]
    async fn test_refresh_requires_record() {
        let mut reconciler = reconciler();
        let err = reconciler.refresh().await.unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_import() {
        let existing = replication_to(&["us-west-2", "us-east-2"]);
        let registry = MockRegistry::new().with_configuration(wire(&existing));
        let mut reconciler = Reconciler::new(registry);

        let record = reconciler.import(ACCOUNT_ID).await.unwrap();

        assert_eq!(record.state, ResourceState::Managed);
        assert_eq!(record.last_known.destination_count(), 2);
        assert_eq!(reconciler.client().write_count(), 0);
    }

    #[tokio::test]
    async fn test_import_empty_configuration() {
        let mut reconciler = reconciler();

        let record = reconciler.import(ACCOUNT_ID).await.unwrap();

        assert!(record.last_known.is_empty());
        assert_eq!(reconciler.state(), ResourceState::Managed);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_identifier() {
        let mut reconciler = reconciler();

        for identifier in ["", "12345", "12345678901a", "1234567890123"] {
            let err = reconciler.import(identifier).await.unwrap_err();
            assert!(matches!(err, ReconcileError::InvalidIdentifier { .. }));
        }
        assert_untouched(reconciler.client());
    }

    #[tokio::test]
    async fn test_import_identity_mismatch() {
        let mut reconciler = reconciler();

        let err = reconciler.import(OTHER_ACCOUNT_ID).await.unwrap_err();

        assert!(matches!(err, ReconcileError::IdentityMismatch { .. }));
        assert_eq!(reconciler.state(), ResourceState::Absent);
    }

    #[tokio::test]
    async fn test_update_against_other_registry() {
        let registry = Arc::new(MockRegistry::for_account(OTHER_ACCOUNT_ID));
        let record = ManagedRecord::new(
            Some(ACCOUNT_ID.to_string()),
            ResourceState::Managed,
            ReplicationConfiguration::empty(),
            WireConfiguration::empty().digest(),
        );
        let mut reconciler = Reconciler::new(registry).with_record(Some(record));

        let err = reconciler
            .update(&replication_to(&["us-west-2"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::IdentityMismatch {
                operation: Operation::Update,
                ..
            }
        ));
        assert_eq!(reconciler.state(), ResourceState::Tainted);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let mut reconciler = reconciler().with_cancellation(token);

        let err = reconciler
            .create(&replication_to(&["us-west-2"]))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(reconciler.state(), ResourceState::Absent);
        assert_untouched(reconciler.client());
    }

    #[tokio::test]
    async fn test_cancelled_before_update_keeps_record() {
        let registry = Arc::new(MockRegistry::new());
        let token = CancellationToken::new();
        let mut reconciler =
            Reconciler::new(Arc::clone(&registry)).with_cancellation(token.clone());
        reconciler.create(&replication_to(&["us-west-2"])).await.unwrap();
        let before = reconciler.record().cloned();

        token.cancel();
        let err = reconciler
            .update(&replication_to(&["eu-west-1"]))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(reconciler.state(), ResourceState::Managed);
        assert_eq!(reconciler.record().cloned(), before);
        assert_eq!(registry.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_write_taints_record() {
        let registry = Arc::new(MockRegistry::new().with_latency(Duration::from_secs(60)));
        let token = CancellationToken::new();
        let record = ManagedRecord::new(
            Some(ACCOUNT_ID.to_string()),
            ResourceState::Managed,
            ReplicationConfiguration::empty(),
            WireConfiguration::empty().digest(),
        );
        let mut reconciler = Reconciler::new(Arc::clone(&registry))
            .with_record(Some(record))
            .with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            token.cancel();
        });
        let err = reconciler
            .update(&replication_to(&["us-west-2"]))
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(
            err,
            ReconcileError::Cancelled {
                operation: Operation::Update
            }
        ));
        assert_eq!(reconciler.state(), ResourceState::Tainted);
        assert!(registry.stored().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_client_error_maps_to_cancelled() {
        let mut reconciler = reconciler();
        reconciler
            .client()
            .fail_next_read(ClientError::cancelled("caller went away"));

        let err = reconciler.import(ACCOUNT_ID).await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Cancelled {
                operation: Operation::Import
            }
        ));
    }
}
