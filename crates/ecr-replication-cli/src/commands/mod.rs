//! CLI commands and argument parsing.

pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod read;
pub mod status;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ecr_replication_client::{ClientAuth, ClientConfig, HttpRegistryClient};
use ecr_replication_core::ReplicationConfiguration;
use ecr_replication_reconciler::{Reconciler, StateFile};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// ecr-replication - manage a registry's cross-region replication configuration
#[derive(Parser)]
#[command(name = "ecr-replication")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub remote: RemoteArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Validate a declared configuration
    Validate(validate::ValidateArgs),

    /// Show the replacement payload for a declared configuration
    Plan(plan::PlanArgs),

    /// Create or update the remote configuration
    Apply(apply::ApplyArgs),

    /// Read the remote configuration
    Read(read::ReadArgs),

    /// Take over an existing remote configuration
    Import(import::ImportArgs),

    /// Reset the remote configuration to empty
    Destroy(destroy::DestroyArgs),

    /// Show the local record
    Status(status::StatusArgs),

    /// Show version information
    Version,
}

/// Connection and state options shared by all commands.
#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// Region of the managed registry
    #[arg(long, env = "ECR_REPLICATION_REGION", global = true)]
    pub region: Option<String>,

    /// API endpoint override
    #[arg(long, env = "ECR_REPLICATION_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "ECR_REPLICATION_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Path to the local state file
    #[arg(long, global = true, default_value = ".ecr-replication/state.json")]
    pub state_file: PathBuf,
}

impl RemoteArgs {
    /// Builds the client configuration.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let region = self
            .region
            .as_deref()
            .context("a region is required: pass --region or set ECR_REPLICATION_REGION")?;

        let mut config = ClientConfig::new(region);
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint);
        }
        if let Some(token) = &self.token {
            config = config.with_auth(ClientAuth::bearer(token));
        }
        Ok(config)
    }

    /// Returns the state file.
    pub fn store(&self) -> StateFile {
        StateFile::new(&self.state_file)
    }

    /// Builds a reconciler starting from the persisted record.
    ///
    /// Remote calls are cancelled on Ctrl-C.
    pub fn reconciler(&self) -> Result<(StateFile, Reconciler<HttpRegistryClient>)> {
        let store = self.store();
        let record = store.load()?;
        let client = HttpRegistryClient::new(self.client_config()?)
            .context("failed to create registry client")?;

        let reconciler = Reconciler::new(client)
            .with_record(record)
            .with_cancellation(cancel_on_interrupt());
        Ok((store, reconciler))
    }
}

/// Output format.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Loads a declared configuration from YAML or JSON.
///
/// Files ending in `.json` are parsed as JSON, everything else as YAML.
pub fn load_declaration(path: &Path) -> Result<ReplicationConfiguration> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?
    };
    Ok(config)
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints a configuration tree in text form.
pub fn print_configuration(config: &ReplicationConfiguration) {
    if config.is_empty() {
        println!("  (no replication rules)");
        return;
    }
    for (i, rule) in config.rules.iter().enumerate() {
        println!("  rule[{i}]");
        for destination in &rule.destinations {
            println!("    → {} ({})", destination.region, destination.registry_id);
        }
        for filter in &rule.repository_filters {
            println!("    filter {} {}", filter.filter_type, filter.filter);
        }
    }
}

fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling remote call");
            trigger.cancel();
        }
    });
    token
}
