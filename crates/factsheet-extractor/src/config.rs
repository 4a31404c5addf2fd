//! Configuration for the Extractor

use crate::pages::DEFAULT_PAGE_MARKER_PATTERN;
use factsheet_llm::CallPolicy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum chunk size (characters)
    pub chunk_max_chars: usize,

    /// Regex for page marker tokens; the first capture group is the page number
    pub page_marker_pattern: String,

    /// Timeout and retry for the per-chunk extraction call
    pub call: CallPolicy,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_max_chars == 0 {
            return Err("chunk_max_chars must be greater than 0".to_string());
        }
        let marker = Regex::new(&self.page_marker_pattern)
            .map_err(|e| format!("page_marker_pattern is not a valid regex: {}", e))?;
        if marker.captures_len() < 2 {
            return Err("page_marker_pattern needs a capture group for the page number".to_string());
        }
        self.call.validate()
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            chunk_max_chars: 4000,
            page_marker_pattern: DEFAULT_PAGE_MARKER_PATTERN.to_string(),
            call: CallPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_max_chars, 4000);
    }

    #[test]
    fn test_invalid_chunk_size() {
        let config = ExtractorConfig {
            chunk_max_chars: 0,
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_marker_pattern_needs_capture_group() {
        let config = ExtractorConfig {
            page_marker_pattern: r"<!-- page \d+ -->".to_string(),
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ExtractorConfig::from_toml("chunk_max_chars = 1200").unwrap();
        assert_eq!(parsed.chunk_max_chars, 1200);
        assert_eq!(parsed.call, CallPolicy::default());
    }
}
