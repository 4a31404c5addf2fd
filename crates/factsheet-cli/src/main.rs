//! Factsheet CLI - Fact extraction and consolidation for impact reports.

use clap::Parser;
use factsheet_cli::commands;
use factsheet_cli::{config, Cli, Command, Formatter};
use factsheet_store::CheckpointManager;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr, stdout carries reports)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run() -> factsheet_cli::Result<()> {
    let cli = Cli::parse();
    let formatter = Formatter::new(cli.format, !cli.no_color);

    // Normalization needs no configuration
    if let Command::Normalize(args) = cli.command {
        return commands::execute_normalize(args, &formatter);
    }

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(path) = cli.checkpoint {
        config.checkpoint_path = path;
    }

    match cli.command {
        Command::Run(args) => commands::execute_run(args, config, &formatter).await,
        Command::Checkpoint(args) => {
            let manager = CheckpointManager::new(&config.checkpoint_path);
            commands::execute_checkpoint(args, &manager, &formatter)
        }
        Command::Normalize(args) => commands::execute_normalize(args, &formatter),
    }
}
