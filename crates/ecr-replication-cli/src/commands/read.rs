//! Read command implementation.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::{print_configuration, print_json, OutputFormat, RemoteArgs};

/// Arguments for the read command.
#[derive(Args)]
pub struct ReadArgs {
    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Runs the read command. The local record is not changed.
pub async fn run(args: &ReadArgs, remote: &RemoteArgs) -> Result<()> {
    info!(region = ?remote.region, "Reading replication configuration");

    let (_, reconciler) = remote.reconciler()?;
    let config = reconciler.read().await.context("read failed")?;

    match args.format {
        OutputFormat::Text => {
            println!(
                "Replication configuration of registry {}:",
                config.registry_id.as_deref().unwrap_or("unknown")
            );
            print_configuration(&config);
        }
        OutputFormat::Json => print_json(&config)?,
    }
    Ok(())
}
