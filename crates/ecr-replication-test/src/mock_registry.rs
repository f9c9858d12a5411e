//! In-memory [`RemoteClient`] with fault injection.
//!
//! [`MockRegistry`] stores one replication configuration and behaves like
//! the remote API: writes replace it wholesale, reads return it verbatim.
//! Faults are queued per operation and consumed in order.
//!
//! # Examples
//!
//! ```rust
//! use ecr_replication_client::{ClientError, RemoteClient};
//! use ecr_replication_test::MockRegistry;
//!
//! # tokio_test_block_on(async {
//! let registry = MockRegistry::new();
//! registry.fail_next_read(ClientError::throttled("Rate exceeded"));
//!
//! assert!(registry.read_configuration().await.is_err());
//! assert!(registry.read_configuration().await.is_ok());
//! assert_eq!(registry.read_count(), 2);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use ecr_replication_client::{ClientError, RemoteClient};
use ecr_replication_core::{WireConfiguration, WireRegistry};
use parking_lot::Mutex;

use crate::fixtures::ACCOUNT_ID;

#[derive(Debug, Default)]
struct Inner {
    stored: Option<WireConfiguration>,
    before_last_write: Option<WireConfiguration>,
    read_errors: VecDeque<ClientError>,
    write_errors: VecDeque<ClientError>,
    errors_after_apply: VecDeque<ClientError>,
    stale_reads: usize,
    read_override: Option<WireRegistry>,
    reads: usize,
    writes: usize,
    write_log: Vec<WireConfiguration>,
}

/// Mock registry API for reconciler tests.
#[derive(Debug)]
pub struct MockRegistry {
    registry_id: String,
    latency: Option<Duration>,
    inner: Mutex<Inner>,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    /// Creates an unconfigured registry owned by [`ACCOUNT_ID`].
    #[must_use]
    pub fn new() -> Self {
        Self::for_account(ACCOUNT_ID)
    }

    /// Creates an unconfigured registry owned by `registry_id`.
    #[must_use]
    pub fn for_account(registry_id: impl Into<String>) -> Self {
        Self {
            registry_id: registry_id.into(),
            latency: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Seeds the stored configuration.
    #[must_use]
    pub fn with_configuration(self, configuration: WireConfiguration) -> Self {
        self.inner.lock().stored = Some(configuration);
        self
    }

    /// Delays every call by `latency` before it takes effect.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns the registry id reported by reads.
    #[must_use]
    pub fn registry_id(&self) -> &str {
        &self.registry_id
    }

    /// Fails the next read with `error`.
    pub fn fail_next_read(&self, error: ClientError) {
        self.inner.lock().read_errors.push_back(error);
    }

    /// Fails the next write with `error` without applying it.
    pub fn fail_next_write(&self, error: ClientError) {
        self.inner.lock().write_errors.push_back(error);
    }

    /// Applies the next write, then reports `error` anyway.
    ///
    /// Models a response lost after the remote side committed the change.
    pub fn fail_next_write_after_apply(&self, error: ClientError) {
        self.inner.lock().errors_after_apply.push_back(error);
    }

    /// Makes the next `count` reads return the configuration stored before
    /// the most recent write.
    pub fn stale_reads(&self, count: usize) {
        self.inner.lock().stale_reads = count;
    }

    /// Makes every read return `registry` verbatim until cleared.
    pub fn override_reads(&self, registry: WireRegistry) {
        self.inner.lock().read_override = Some(registry);
    }

    /// Removes a read override.
    pub fn clear_read_override(&self) {
        self.inner.lock().read_override = None;
    }

    /// Replaces the stored configuration without going through a write.
    ///
    /// Models a change made by someone else.
    pub fn modify_remotely(&self, configuration: WireConfiguration) {
        self.inner.lock().stored = Some(configuration);
    }

    /// Returns the stored configuration (empty when never configured).
    #[must_use]
    pub fn stored(&self) -> WireConfiguration {
        self.inner.lock().stored.clone().unwrap_or_default()
    }

    /// Number of reads attempted, including failed ones.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.inner.lock().reads
    }

    /// Number of writes attempted, including failed ones.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }

    /// Total number of remote calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        let inner = self.inner.lock();
        inner.reads + inner.writes
    }

    /// Payloads of every write that was applied, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<WireConfiguration> {
        self.inner.lock().write_log.clone()
    }

    /// Payload of the most recent applied write.
    #[must_use]
    pub fn last_write(&self) -> Option<WireConfiguration> {
        self.inner.lock().write_log.last().cloned()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteClient for MockRegistry {
    async fn read_configuration(&self) -> Result<WireRegistry, ClientError> {
        self.delay().await;

        let mut inner = self.inner.lock();
        inner.reads += 1;

        if let Some(error) = inner.read_errors.pop_front() {
            return Err(error);
        }
        if let Some(registry) = &inner.read_override {
            return Ok(registry.clone());
        }

        let configuration = if inner.stale_reads > 0 {
            inner.stale_reads -= 1;
            inner.before_last_write.clone()
        } else {
            inner.stored.clone()
        };

        Ok(WireRegistry {
            registry_id: Some(self.registry_id.clone()),
            replication_configuration: configuration,
        })
    }

    async fn write_configuration(
        &self,
        configuration: &WireConfiguration,
    ) -> Result<(), ClientError> {
        self.delay().await;

        let mut inner = self.inner.lock();
        inner.writes += 1;

        if let Some(error) = inner.write_errors.pop_front() {
            return Err(error);
        }

        inner.before_last_write = inner.stored.take();
        inner.stored = Some(configuration.clone());
        inner.write_log.push(configuration.clone());

        match inner.errors_after_apply.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
