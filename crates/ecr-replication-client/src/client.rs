//! The remote client seam.

use std::sync::Arc;

use async_trait::async_trait;
use ecr_replication_core::{WireConfiguration, WireRegistry};

use crate::error::ClientError;

/// Access to a registry's replication configuration.
///
/// Implementations perform exactly one remote call per method and never
/// retry; retry policy belongs to the caller.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Reads the registry description, including its current configuration.
    async fn read_configuration(&self) -> Result<WireRegistry, ClientError>;

    /// Replaces the registry's configuration with `configuration`.
    ///
    /// The write is a full replacement: anything not in `configuration`
    /// is removed remotely.
    async fn write_configuration(
        &self,
        configuration: &WireConfiguration,
    ) -> Result<(), ClientError>;
}

#[async_trait]
impl<T: RemoteClient + ?Sized> RemoteClient for Arc<T> {
    async fn read_configuration(&self) -> Result<WireRegistry, ClientError> {
        (**self).read_configuration().await
    }

    async fn write_configuration(
        &self,
        configuration: &WireConfiguration,
    ) -> Result<(), ClientError> {
        (**self).write_configuration(configuration).await
    }
}

#[async_trait]
impl<T: RemoteClient + ?Sized> RemoteClient for Box<T> {
    async fn read_configuration(&self) -> Result<WireRegistry, ClientError> {
        (**self).read_configuration().await
    }

    async fn write_configuration(
        &self,
        configuration: &WireConfiguration,
    ) -> Result<(), ClientError> {
        (**self).write_configuration(configuration).await
    }
}
