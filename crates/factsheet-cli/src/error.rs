//! Error types for the CLI application.

use factsheet_pipeline::PipelineError;
use factsheet_store::CheckpointError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline run failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Checkpoint error
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    /// Process exit code for this error
    ///
    /// 130 for an interrupted run, matching the shell convention for SIGINT.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Pipeline(PipelineError::Interrupted { .. }) => 130,
            _ => 1,
        }
    }
}
