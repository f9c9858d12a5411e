//! Import command implementation.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::apply::print_record;
use super::{print_json, OutputFormat, RemoteArgs};

/// Arguments for the import command.
#[derive(Args)]
pub struct ImportArgs {
    /// Registry (account) id, 12 digits
    pub registry_id: String,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Runs the import command.
pub async fn run(args: &ImportArgs, remote: &RemoteArgs) -> Result<()> {
    info!(registry_id = %args.registry_id, "Importing replication configuration");

    let (store, mut reconciler) = remote.reconciler()?;
    let record = reconciler
        .import(&args.registry_id)
        .await
        .context("import failed")?;
    store.save(&record)?;

    match args.format {
        OutputFormat::Text => print_record("Imported", &record),
        OutputFormat::Json => print_json(&record)?,
    }
    Ok(())
}
