//! Apply command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ecr_replication_reconciler::{ManagedRecord, ReconcileError};
use tracing::info;

use super::{load_declaration, print_configuration, print_json, OutputFormat, RemoteArgs};

/// Arguments for the apply command.
#[derive(Args)]
pub struct ApplyArgs {
    /// Declared configuration (YAML or JSON)
    pub file: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Runs the apply command.
///
/// The local record is saved whatever the outcome, so a tainted
/// configuration is remembered for the next run.
pub async fn run(args: &ApplyArgs, remote: &RemoteArgs) -> Result<()> {
    info!(path = ?args.file, "Applying replication configuration");

    let desired = load_declaration(&args.file)?;
    let (store, mut reconciler) = remote.reconciler()?;

    let result = reconciler.apply(&desired).await;
    store.store(reconciler.record())?;

    let record = result.map_err(explain).context("apply failed")?;
    match args.format {
        OutputFormat::Text => print_record("Applied", &record),
        OutputFormat::Json => print_json(&record)?,
    }
    Ok(())
}

/// Prints a record in text form.
pub fn print_record(verb: &str, record: &ManagedRecord) {
    println!(
        "✓ {verb} replication configuration for registry {} [{}]",
        record.id.as_deref().unwrap_or("unknown"),
        record.state
    );
    print_configuration(&record.last_known);
}

/// Adds a hint about what to do next.
pub fn explain(err: ReconcileError) -> anyhow::Error {
    let hint = match &err {
        ReconcileError::DriftMismatch { .. } => {
            Some("the write could not be confirmed yet; run apply again")
        }
        ReconcileError::Transient { .. } => Some("the registry API is unavailable; retry later"),
        ReconcileError::Cancelled { .. } => {
            Some("the operation was interrupted; run apply again to reconcile")
        }
        _ => None,
    };
    match hint {
        Some(hint) => anyhow::Error::new(err).context(hint),
        None => anyhow::Error::new(err),
    }
}
