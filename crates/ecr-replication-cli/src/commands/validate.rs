//! Validate command implementation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use ecr_replication_core::Validate;
use tracing::info;

use super::load_declaration;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Declared configuration (YAML or JSON)
    pub file: PathBuf,
}

/// Runs the validate command.
pub fn run(args: &ValidateArgs) -> Result<()> {
    info!(path = ?args.file, "Validating replication configuration");

    let config = load_declaration(&args.file)?;

    if let Err(errors) = config.validate() {
        println!("✗ {} is invalid:", args.file.display());
        let count = errors.len();
        for error in errors {
            println!("  - {error}");
        }
        anyhow::bail!("{count} validation error(s)");
    }

    println!(
        "✓ {} is valid ({} rule(s), {} destination(s), {} repository filter(s))",
        args.file.display(),
        config.rules.len(),
        config.destination_count(),
        config.filter_count()
    );
    Ok(())
}
