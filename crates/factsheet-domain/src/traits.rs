//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

/// Trait for LLM provider operations
///
/// The model is treated as an untyped oracle: implementations return raw
/// text and callers own validation and repair of whatever comes back.
///
/// Implemented by the infrastructure layer (factsheet-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate output constrained to a JSON schema (if supported)
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;

    /// Check that the provider is reachable before a long run starts
    fn health_check(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Name of the model, for run metadata
    fn model_name(&self) -> &str {
        "llm"
    }
}
