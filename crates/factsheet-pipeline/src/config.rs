//! Configuration for a pipeline run

use factsheet_categorizer::CategorizerConfig;
use factsheet_extractor::ExtractorConfig;
use factsheet_llm::ollama::{DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use factsheet_reconciler::ConflictConfig;
use factsheet_store::DEFAULT_CHECKPOINT_PATH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of the environment variables that override file settings
pub const ENV_PREFIX: &str = "FACTSHEET_";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Configuration for a pipeline run
///
/// # Examples
///
/// ```
/// use factsheet_pipeline::PipelineConfig;
///
/// let config = PipelineConfig::from_toml(r#"
/// checkpoint_every_n_chunks = 10
///
/// [extractor]
/// chunk_max_chars = 3000
///
/// [conflict]
/// tolerance = 0.05
/// "#).unwrap();
///
/// assert_eq!(config.checkpoint_every_n_chunks, 10);
/// assert_eq!(config.extractor.chunk_max_chars, 3000);
/// assert_eq!(config.concurrency, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Save a checkpoint after every N processed chunks
    /// Default: 5
    pub checkpoint_every_n_chunks: usize,

    /// Chunk extractions (and categorizations) in flight at once
    /// Default: 1
    pub concurrency: usize,

    /// Checkpoint file location
    pub checkpoint_path: PathBuf,

    /// Model connection and sampling settings
    pub llm: LlmSettings,

    /// Chunking, page markers and extraction call policy
    pub extractor: ExtractorConfig,

    /// Conflict rule thresholds
    pub conflict: ConflictConfig,

    /// Categorization settings
    pub categorizer: CategorizerConfig,
}

/// Model connection and sampling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Sampling temperature, low to favour stable structured output
    pub temperature: f32,

    /// Cap on generated tokens per call
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            checkpoint_every_n_chunks: 5,
            concurrency: 1,
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            llm: LlmSettings::default(),
            extractor: ExtractorConfig::default(),
            conflict: ConflictConfig::default(),
            categorizer: CategorizerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.checkpoint_every_n_chunks == 0 {
            return Err("checkpoint_every_n_chunks must be greater than 0".to_string());
        }
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        if self.checkpoint_path.as_os_str().is_empty() {
            return Err("checkpoint_path must not be empty".to_string());
        }
        if self.llm.model.trim().is_empty() {
            return Err("llm.model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err("llm.temperature must be between 0.0 and 2.0".to_string());
        }
        if self.llm.max_tokens == 0 {
            return Err("llm.max_tokens must be greater than 0".to_string());
        }

        self.extractor.validate()?;
        self.conflict.validate()?;
        self.categorizer.validate()
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&contents)
    }

    /// Apply `FACTSHEET_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `FACTSHEET_*` overrides from any variable source
    ///
    /// Recognized: `CHUNK_MAX_CHARS`, `CHECKPOINT_EVERY_N_CHUNKS`,
    /// `CHECKPOINT_PATH`, `CONCURRENCY`, `CONFLICT_TOLERANCE`,
    /// `LLM_ENDPOINT`, `LLM_MODEL`, `LLM_TEMPERATURE`, `LLM_MAX_TOKENS`,
    /// `LLM_TIMEOUT_SECS` (both extraction and categorization calls).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = parsed(&var, "CHUNK_MAX_CHARS")? {
            self.extractor.chunk_max_chars = v;
        }
        if let Some(v) = parsed(&var, "CHECKPOINT_EVERY_N_CHUNKS")? {
            self.checkpoint_every_n_chunks = v;
        }
        if let Some(v) = var("CHECKPOINT_PATH") {
            self.checkpoint_path = PathBuf::from(v);
        }
        if let Some(v) = parsed(&var, "CONCURRENCY")? {
            self.concurrency = v;
        }
        if let Some(v) = parsed(&var, "CONFLICT_TOLERANCE")? {
            self.conflict.tolerance = v;
        }
        if let Some(v) = var("LLM_ENDPOINT") {
            self.llm.endpoint = v;
        }
        if let Some(v) = var("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = parsed(&var, "LLM_TEMPERATURE")? {
            self.llm.temperature = v;
        }
        if let Some(v) = parsed(&var, "LLM_MAX_TOKENS")? {
            self.llm.max_tokens = v;
        }
        if let Some(v) = parsed(&var, "LLM_TIMEOUT_SECS")? {
            self.extractor.call.timeout_secs = v;
            self.categorizer.call.timeout_secs = v;
        }
        Ok(())
    }
}

fn parsed<T, F>(var: &F, name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("Invalid {}{}='{}': {}", ENV_PREFIX, name, raw, e)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.extractor.chunk_max_chars, 4000);
        assert_eq!(config.checkpoint_every_n_chunks, 5);
        assert_eq!(config.conflict.tolerance, 0.02);
        assert_eq!(config.llm.temperature, 0.1);
        assert_eq!(config.llm.max_tokens, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = PipelineConfig::default();
        config.concurrency = 4;
        config.llm.model = "mistral".to_string();
        config.conflict.tolerance = 0.05;

        let parsed = PipelineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PipelineConfig::default();
        config
            .apply_overrides(env(&[
                ("FACTSHEET_CHUNK_MAX_CHARS", "2500"),
                ("FACTSHEET_CONFLICT_TOLERANCE", "0.1"),
                ("FACTSHEET_LLM_MODEL", "qwen2.5"),
                ("FACTSHEET_LLM_TIMEOUT_SECS", "30"),
                ("UNRELATED", "1"),
            ]))
            .unwrap();

        assert_eq!(config.extractor.chunk_max_chars, 2500);
        assert_eq!(config.conflict.tolerance, 0.1);
        assert_eq!(config.llm.model, "qwen2.5");
        assert_eq!(config.extractor.call.timeout_secs, 30);
        assert_eq!(config.categorizer.call.timeout_secs, 30);
        assert_eq!(config.checkpoint_every_n_chunks, 5);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = PipelineConfig::default();
        let err = config
            .apply_overrides(env(&[("FACTSHEET_CONCURRENCY", "many")]))
            .unwrap_err();
        assert!(err.contains("FACTSHEET_CONCURRENCY"));
    }

    #[test]
    fn test_validation() {
        let mut config = PipelineConfig::default();
        config.checkpoint_every_n_chunks = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.extractor.chunk_max_chars = 0;
        assert!(config.validate().is_err());
    }
}
