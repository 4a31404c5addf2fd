//! Factsheet LLM Provider Layer
//!
//! Pluggable LLM provider implementations plus the call-site policy every
//! pipeline stage uses to talk to them.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from
//! `factsheet-domain`. It supports multiple LLM backends with a common
//! interface, and [`invoke_structured`] wraps any of them with a per-attempt
//! timeout and retry with exponential backoff for transient failures.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use factsheet_llm::MockProvider;
//! use factsheet_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("[]");
//! let result = provider.generate("test prompt").unwrap();
//! assert_eq!(result, "[]");
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod policy;

use factsheet_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaProvider;
pub use policy::{check_health, invoke_structured, CallPolicy};

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// The call did not complete within its deadline
    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_) | LlmError::RateLimitExceeded | LlmError::Timeout(_)
        )
    }
}

/// Scripted reply for prompts matching a rule
#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail,
    Transient,
}

/// Mock LLM provider for deterministic testing
///
/// This provider returns pre-configured responses without making any network calls.
/// Replies can be keyed on the exact prompt or on a substring of it, which is
/// how tests target one chunk of a document.
///
/// # Examples
///
/// ```
/// use factsheet_llm::MockProvider;
/// use factsheet_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// // Multiple responses
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.add_response_containing("chunk two", "response2");
/// assert_eq!(provider.generate("prompt1").unwrap(), "response1");
/// assert_eq!(provider.generate("text of chunk two here").unwrap(), "response2");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, MockReply>>>,
    rules: Arc<Mutex<Vec<(String, MockReply)>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
    healthy: bool,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            rules: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            healthy: true,
        }
    }

    /// Add a specific response for a given prompt
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt.into(), MockReply::Text(response.into()));
    }

    /// Respond with `response` to any prompt containing `needle`
    ///
    /// Rules are checked in insertion order; the first match wins.
    pub fn add_response_containing(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.rules
            .lock()
            .unwrap()
            .push((needle.into(), MockReply::Text(response.into())));
    }

    /// Configure to return a permanent error for a specific prompt
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        self.responses.lock().unwrap().insert(prompt.into(), MockReply::Fail);
    }

    /// Return a permanent error for any prompt containing `needle`
    pub fn add_error_containing(&mut self, needle: impl Into<String>) {
        self.rules.lock().unwrap().push((needle.into(), MockReply::Fail));
    }

    /// Return a transient (retryable) error for any prompt containing `needle`
    pub fn add_transient_error_containing(&mut self, needle: impl Into<String>) {
        self.rules.lock().unwrap().push((needle.into(), MockReply::Transient));
    }

    /// Sleep this long before answering, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `health_check` fail
    pub fn unreachable(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Number of calls whose prompt contained `needle`
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.prompts.lock().unwrap().clear();
    }

    fn reply_for(&self, prompt: &str) -> MockReply {
        if let Some(reply) = self.responses.lock().unwrap().get(prompt) {
            return reply.clone();
        }
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        match self.reply_for(prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail => Err(LlmError::Other("Mock error".to_string())),
            MockReply::Transient => Err(LlmError::Communication("Mock connection reset".to_string())),
        }
    }

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }

    fn health_check(&self) -> Result<(), Self::Error> {
        if self.healthy {
            Ok(())
        } else {
            Err(LlmError::Communication("Mock provider unreachable".to_string()))
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate("any prompt");
        assert_eq!(result.unwrap(), "Test response");
    }

    #[test]
    fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate("hello").unwrap(), "world");
        assert_eq!(provider.generate("foo").unwrap(), "bar");
        assert_eq!(provider.generate("unknown").unwrap(), "Default mock response");
    }

    #[test]
    fn test_mock_provider_substring_rules_first_match_wins() {
        let mut provider = MockProvider::default();
        provider.add_response_containing("page 3", "third");
        provider.add_response_containing("page", "any page");

        assert_eq!(provider.generate("text from page 3").unwrap(), "third");
        assert_eq!(provider.generate("text from page 4").unwrap(), "any page");
    }

    #[test]
    fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");

        assert_eq!(provider.call_count(), 0);

        provider.generate("prompt1").unwrap();
        assert_eq!(provider.call_count(), 1);

        provider.generate("prompt2").unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls_containing("prompt2"), 1);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_mock_provider_errors() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");
        provider.add_transient_error_containing("flaky");

        let permanent = provider.generate("bad prompt").unwrap_err();
        assert!(matches!(permanent, LlmError::Other(_)));
        assert!(!permanent.is_transient());

        let transient = provider.generate("a flaky prompt").unwrap_err();
        assert!(transient.is_transient());
    }

    #[test]
    fn test_mock_provider_health() {
        assert!(MockProvider::default().health_check().is_ok());
        assert!(MockProvider::default().unreachable().health_check().is_err());
    }

    #[test]
    fn test_mock_provider_clone() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate("test").unwrap();

        // Both should share the same call count due to Arc
        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
