//! Error types for the Extractor

use factsheet_llm::LlmError;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// None of these abort a pipeline run: the extractor folds them into an
/// [`crate::ExtractionOutcome`] for the chunk and moves on.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error (after retries)
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Model output could not be read as a list of facts, even after repair
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Invalid page marker pattern
    #[error("Invalid page marker pattern: {0}")]
    PageMarker(#[from] regex::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
