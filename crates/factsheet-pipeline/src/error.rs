//! Error types for pipeline runs

use factsheet_llm::LlmError;
use factsheet_store::CheckpointError;
use thiserror::Error;

/// Errors that end a pipeline run
///
/// Per-chunk and per-fact failures never appear here; they are logged and
/// counted in the run summary instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Checkpoint could not be written or read from disk
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// No LLM provider reachable before the run started
    #[error("LLM provider unavailable: {0}")]
    ProviderUnavailable(#[source] LlmError),

    /// Run stopped by a shutdown signal after progress was saved
    #[error("Run interrupted after {processed_chunks} chunks; progress saved to checkpoint")]
    Interrupted {
        /// Contiguous prefix of chunks recorded in the checkpoint
        processed_chunks: usize,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
