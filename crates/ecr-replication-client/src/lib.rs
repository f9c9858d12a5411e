//! # ECR Replication Client
//!
//! Remote access to a registry's replication configuration.
//!
//! This crate provides:
//!
//! - [`RemoteClient`] - the seam the reconciler talks through
//! - [`HttpRegistryClient`] - a client for the registry's JSON 1.1 API
//! - [`ClientError`] - failures classified by [`ClientErrorKind`]
//!
//! ## Example
//!
//! ```no_run
//! use ecr_replication_client::{ClientAuth, ClientConfig, HttpRegistryClient, RemoteClient};
//!
//! # async fn example() -> Result<(), ecr_replication_client::ClientError> {
//! let config = ClientConfig::new("us-east-1")
//!     .with_endpoint("http://localhost:4566")
//!     .with_auth(ClientAuth::bearer("token"));
//! let client = HttpRegistryClient::new(config)?;
//!
//! let registry = client.read_configuration().await?;
//! println!("{} rule(s)", registry.configuration().rules.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod http;

pub use client::RemoteClient;
pub use config::{ClientAuth, ClientConfig};
pub use error::{ClientError, ClientErrorKind};
pub use http::{Action, HttpRegistryClient};
