//! Destroy command implementation.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::apply::explain;
use super::RemoteArgs;

/// Arguments for the destroy command.
#[derive(Args)]
pub struct DestroyArgs {}

/// Runs the destroy command.
///
/// The registry keeps its (now empty) configuration; only management ends.
pub async fn run(_args: &DestroyArgs, remote: &RemoteArgs) -> Result<()> {
    info!(state_file = ?remote.state_file, "Destroying replication configuration");

    let (store, mut reconciler) = remote.reconciler()?;
    if reconciler.record().is_none() {
        println!("Nothing recorded in {}; nothing to do.", store.path().display());
        return Ok(());
    }

    let result = reconciler.delete().await;
    store.store(reconciler.record())?;
    result.map_err(explain).context("destroy failed")?;

    println!("✓ Replication configuration reset to empty");
    Ok(())
}
