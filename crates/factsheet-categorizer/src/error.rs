//! Error types for the Categorizer

use factsheet_domain::TaxonomyError;
use factsheet_llm::LlmError;
use thiserror::Error;

/// Errors that can occur while categorizing one fact
///
/// Each of these fails only the fact being categorized.
#[derive(Error, Debug)]
pub enum CategorizerError {
    /// LLM provider error (after retries)
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Model output is not a categorization object
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Labels outside the taxonomy, or a subcategory under the wrong category
    #[error("Invalid taxonomy value: {0}")]
    Taxonomy(#[from] TaxonomyError),
}
