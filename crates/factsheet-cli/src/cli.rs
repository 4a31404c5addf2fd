//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Factsheet - Extract, reconcile and categorize facts from impact reports.
#[derive(Debug, Parser)]
#[command(name = "factsheet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.factsheet/config.toml)
    #[arg(short, long, global = true, env = "FACTSHEET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Checkpoint file path (overrides the configuration)
    #[arg(long, global = true)]
    pub checkpoint: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process a document and write the record sets
    Run(RunArgs),

    /// Inspect or delete the checkpoint
    Checkpoint(CheckpointArgs),

    /// Show how a value and unit are normalized
    Normalize(NormalizeArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Plain-text document with page markers
    pub input: PathBuf,

    /// Directory for mentions.json, consolidated.json and factsheet.json
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Resume from a matching checkpoint without asking
    #[arg(long, conflicts_with = "restart")]
    pub resume: bool,

    /// Ignore any checkpoint and start from the first chunk
    #[arg(long)]
    pub restart: bool,

    /// Chunk extractions in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,
}

/// Arguments for checkpoint management.
#[derive(Debug, Parser)]
pub struct CheckpointArgs {
    #[command(subcommand)]
    pub action: CheckpointAction,
}

/// Checkpoint actions.
#[derive(Debug, Subcommand)]
pub enum CheckpointAction {
    /// Show the saved progress
    Show,

    /// Delete the checkpoint
    Clear {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Arguments for the normalize command.
#[derive(Debug, Parser)]
pub struct NormalizeArgs {
    /// Numeric value
    #[arg(allow_negative_numbers = true)]
    pub value: f64,

    /// Unit as written in a report (e.g. "t/yr", "acres")
    pub unit: String,
}
