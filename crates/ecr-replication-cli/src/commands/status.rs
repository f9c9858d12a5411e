//! Status command implementation.

use anyhow::{Context, Result};
use clap::Args;
use ecr_replication_core::DriftReport;
use ecr_replication_reconciler::{ManagedRecord, ResourceState};
use serde::Serialize;
use tracing::info;

use super::{print_configuration, print_json, OutputFormat, RemoteArgs};

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Compare the record with the remote configuration
    #[arg(long)]
    pub refresh: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Status summary.
#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub state: ResourceState,
    pub record: Option<ManagedRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftReport>,
}

/// Runs the status command.
pub async fn run(args: &StatusArgs, remote: &RemoteArgs) -> Result<()> {
    info!(state_file = ?remote.state_file, refresh = args.refresh, "Checking status");

    let summary = if args.refresh {
        refreshed_status(remote).await?
    } else {
        local_status(remote)?
    };

    match args.format {
        OutputFormat::Text => print_text_status(&summary),
        OutputFormat::Json => print_json(&summary)?,
    }
    Ok(())
}

fn local_status(remote: &RemoteArgs) -> Result<StatusSummary> {
    let record = remote.store().load()?;
    Ok(StatusSummary {
        state: record.as_ref().map_or(ResourceState::Absent, |r| r.state),
        record,
        drift: None,
    })
}

async fn refreshed_status(remote: &RemoteArgs) -> Result<StatusSummary> {
    let (store, mut reconciler) = remote.reconciler()?;
    if reconciler.record().is_none() {
        return Ok(StatusSummary {
            state: ResourceState::Absent,
            record: None,
            drift: None,
        });
    }

    let drift = reconciler.refresh().await.context("refresh failed")?;
    store.store(reconciler.record())?;

    Ok(StatusSummary {
        state: reconciler.state(),
        record: reconciler.into_record(),
        drift: Some(drift),
    })
}

fn print_text_status(summary: &StatusSummary) {
    println!("Replication Configuration Status");
    println!("================================");
    println!();

    let Some(record) = &summary.record else {
        println!("Nothing recorded.");
        println!();
        println!("Run 'ecr-replication apply <file>' or 'ecr-replication import <registry-id>'.");
        return;
    };

    let icon = match summary.state {
        ResourceState::Managed => "✓",
        ResourceState::Tainted => "✗",
        ResourceState::Absent => "?",
    };
    println!(
        "{icon} registry {} [{}]",
        record.id.as_deref().unwrap_or("unknown"),
        summary.state
    );
    println!("  Last updated: {}", record.updated_at);
    println!("  Digest: {}", record.digest);
    print_configuration(&record.last_known);

    if summary.state == ResourceState::Tainted {
        println!();
        println!("The last write was not confirmed.");
        println!("Run 'ecr-replication apply <file>' to reconcile.");
    }

    if let Some(drift) = &summary.drift {
        println!();
        if drift.is_empty() {
            println!("Remote configuration matches the record.");
        } else {
            println!("Remote configuration changed since last seen:");
            for difference in drift.iter() {
                println!("  ~ {difference}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecr_replication_core::ReplicationConfiguration;
    use std::path::Path;
    use tempfile::TempDir;

    fn remote(state_file: &Path) -> RemoteArgs {
        RemoteArgs {
            region: None,
            endpoint: None,
            token: None,
            state_file: state_file.to_path_buf(),
        }
    }

    #[test]
    fn test_empty_state() {
        let dir = TempDir::new().unwrap();
        let summary = local_status(&remote(&dir.path().join("state.json"))).unwrap();

        assert_eq!(summary.state, ResourceState::Absent);
        assert!(summary.record.is_none());
    }

    #[test]
    fn test_recorded_state() {
        let dir = TempDir::new().unwrap();
        let args = remote(&dir.path().join("state.json"));
        let record = ManagedRecord::new(
            Some("123456789012".to_string()),
            ResourceState::Tainted,
            ReplicationConfiguration::empty(),
            "sha256:00",
        );
        args.store().save(&record).unwrap();

        let summary = local_status(&args).unwrap();

        assert_eq!(summary.state, ResourceState::Tainted);
        assert_eq!(summary.record, Some(record));
    }

    #[tokio::test]
    async fn test_refresh_without_record_needs_no_remote() {
        let dir = TempDir::new().unwrap();
        let args = RemoteArgs {
            region: Some("us-east-1".to_string()),
            ..remote(&dir.path().join("state.json"))
        };

        let summary = refreshed_status(&args).await.unwrap();
        assert_eq!(summary.state, ResourceState::Absent);
    }
}
