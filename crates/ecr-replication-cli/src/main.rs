//! ecr-replication - command-line interface for a registry's replication configuration.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecr_replication=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate(args) => commands::validate::run(&args),
        Commands::Plan(args) => commands::plan::run(&args, &cli.remote),
        Commands::Apply(args) => commands::apply::run(&args, &cli.remote).await,
        Commands::Read(args) => commands::read::run(&args, &cli.remote).await,
        Commands::Import(args) => commands::import::run(&args, &cli.remote).await,
        Commands::Destroy(args) => commands::destroy::run(&args, &cli.remote).await,
        Commands::Status(args) => commands::status::run(&args, &cli.remote).await,
        Commands::Version => {
            println!("ecr-replication {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
