//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API.
//!
//! # Features
//!
//! - Async HTTP communication with Ollama API
//! - Configurable endpoint, model, temperature and output token limit
//! - JSON-schema constrained output via Ollama's `format` field
//! - HTTP status classification into transient and permanent errors
//!
//! Retries and per-call deadlines are not handled here; callers wrap the
//! provider with [`crate::invoke_structured`].
//!
//! # Examples
//!
//! ```no_run
//! use factsheet_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1")
//!     .with_temperature(0.1)
//!     .with_max_tokens(4096);
//! ```

use crate::LlmError;
use factsheet_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Transport-level timeout; the call policy usually fires first
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default sampling temperature, low to favour stable structured output
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default cap on generated tokens
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    temperature: f32,
    max_tokens: u32,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.1", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Create a new Ollama provider at `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of generated tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Generate text, optionally constrained to a JSON schema
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running (`Communication`, transient)
    /// - Ollama is overloaded (`RateLimitExceeded`, transient)
    /// - Model is not available (`ModelNotAvailable`)
    /// - Response format is invalid (`InvalidResponse`)
    pub async fn generate_async(&self, prompt: &str, schema: Option<&str>) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let format = match schema {
            Some(schema) => Some(serde_json::from_str(schema).map_err(|e| {
                LlmError::Other(format!("Invalid output schema: {}", e))
            })?),
            None => None,
        };

        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| classify_transport_error(&self.endpoint, e))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<OllamaGenerateResponse>()
                .await
                .map(|r| r.response)
                .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let error = if status == reqwest::StatusCode::NOT_FOUND {
            LlmError::ModelNotAvailable(self.model.clone())
        } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        {
            LlmError::RateLimitExceeded
        } else if status.is_server_error() {
            LlmError::Communication(format!("HTTP {}: {}", status, error_text))
        } else {
            LlmError::Other(format!("HTTP {}: {}", status, error_text))
        };
        Err(error)
    }

    /// Check that Ollama answers and has the configured model pulled
    pub async fn health_check_async(&self) -> Result<(), LlmError> {
        #[derive(Deserialize)]
        struct Tags {
            models: Vec<Tag>,
        }
        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }

        let url = format!("{}/api/tags", self.endpoint);
        let tags: Tags = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_transport_error(&self.endpoint, e))?
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse model list: {}", e)))?;

        let wanted = self.model.as_str();
        let present = tags
            .models
            .iter()
            .any(|t| t.name == wanted || t.name.split(':').next() == Some(wanted));
        if present {
            Ok(())
        } else {
            Err(LlmError::ModelNotAvailable(self.model.clone()))
        }
    }

    fn block_on<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, LlmError>>,
    ) -> Result<T, LlmError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?
            .block_on(fut)
    }
}

/// Map a reqwest failure to the error variant that describes its cause
fn classify_transport_error(endpoint: &str, e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    } else if e.is_connect() {
        LlmError::Communication(format!("Cannot connect to Ollama at {}: {}", endpoint, e))
    } else if e.is_decode() {
        LlmError::InvalidResponse(format!("Failed to decode response: {}", e))
    } else if e.is_builder() {
        LlmError::Other(format!("Invalid request: {}", e))
    } else {
        LlmError::Communication(format!("Request failed: {}", e))
    }
}

impl LlmProviderTrait for OllamaProvider {
    type Error = LlmError;

    // Called from the blocking pool by the call policy, never from a
    // runtime worker thread.
    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.block_on(self.generate_async(prompt, None))
    }

    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error> {
        self.block_on(self.generate_async(prompt, Some(schema)))
    }

    fn health_check(&self) -> Result<(), Self::Error> {
        self.block_on(self.health_check_async())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3.1");
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model, "llama3.1");
        assert_eq!(provider.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(provider.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model_name(), "mistral");
    }

    #[test]
    fn test_ollama_provider_builders() {
        let provider = OllamaProvider::default_endpoint("mistral")
            .with_temperature(0.2)
            .with_max_tokens(512);
        assert_eq!(provider.temperature, 0.2);
        assert_eq!(provider.max_tokens, 512);
    }

    #[test]
    fn test_invalid_schema_is_rejected_before_sending() {
        let provider = OllamaProvider::new("http://localhost:1", "llama3.1");
        let result = provider.generate_structured("prompt", "not json");
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[test]
    fn test_ollama_error_handling() {
        // Nothing listens on port 1
        let provider = OllamaProvider::new("http://127.0.0.1:1", "llama3.1");
        let result = provider.generate("test");
        assert!(
            matches!(result, Err(LlmError::Communication(ref msg)) if msg.starts_with("Cannot connect to Ollama at http://127.0.0.1:1")),
            "unexpected error: {:?}",
            result
        );
        assert!(matches!(provider.health_check(), Err(LlmError::Communication(_))));
    }

    #[test]
    fn test_malformed_endpoint_is_not_a_communication_error() {
        let provider = OllamaProvider::new("not a url", "llama3.1");
        let result = provider.generate("test");
        assert!(matches!(result, Err(LlmError::Other(ref msg)) if msg.starts_with("Invalid request")));
        assert!(!result.unwrap_err().is_transient());
    }

    // Integration tests (requires running Ollama)
    #[test]
    #[ignore]
    fn test_ollama_generate_integration() {
        let provider = OllamaProvider::default_endpoint("llama3.1");
        if let Ok(response) = provider.generate("Say 'hello' and nothing else") {
            assert!(!response.is_empty());
        }
    }
}
