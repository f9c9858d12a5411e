//! Plan command implementation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use ecr_replication_core::{compare, DriftReport, Planner, ReplacementPlan};
use ecr_replication_reconciler::ManagedRecord;
use serde::Serialize;
use tracing::info;

use super::{load_declaration, print_json, OutputFormat, RemoteArgs};

/// Arguments for the plan command.
#[derive(Args)]
pub struct PlanArgs {
    /// Declared configuration (YAML or JSON)
    pub file: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    digest: String,
    plan: &'a ReplacementPlan,
    /// Differences from the last known remote configuration, when one is recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<DriftReport>,
}

/// Runs the plan command. Nothing is sent to the registry.
pub fn run(args: &PlanArgs, remote: &RemoteArgs) -> Result<()> {
    info!(path = ?args.file, "Planning replication configuration");

    let desired = load_declaration(&args.file)?;
    let plan = Planner::plan(&desired)?;
    let record = remote.store().load()?;

    let output = PlanOutput {
        digest: plan.digest(),
        plan: &plan,
        changes: record
            .as_ref()
            .map(|record| compare(&desired, &record.last_known)),
    };

    match args.format {
        OutputFormat::Text => print_text(&output, record.as_ref())?,
        OutputFormat::Json => print_json(&output)?,
    }
    Ok(())
}

fn print_text(output: &PlanOutput<'_>, record: Option<&ManagedRecord>) -> Result<()> {
    println!("Replacement plan: {}", output.plan.summary);
    println!("Digest: {}", output.digest);
    println!();
    println!("{}", serde_json::to_string_pretty(&output.plan.payload)?);
    println!();

    match (&output.changes, record) {
        (Some(changes), Some(record)) if changes.is_empty() => {
            println!("No changes: remote configuration was last seen {}.", record.updated_at);
        }
        (Some(changes), _) => {
            println!("Changes from last known configuration:");
            for difference in changes.iter() {
                println!("  ~ {difference}");
            }
        }
        _ => println!("Nothing recorded locally; apply will create the configuration."),
    }
    Ok(())
}
