//! Configuration for the Categorizer

use factsheet_llm::CallPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the Categorizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizerConfig {
    /// Skip categorization entirely; factsheet rows carry no category
    pub enabled: bool,

    /// Longest rationale kept from the model (characters)
    pub max_rationale_chars: usize,

    /// Timeout and retry for each categorization call
    pub call: CallPolicy,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rationale_chars: 500,
            call: CallPolicy::default(),
        }
    }
}

impl CategorizerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_rationale_chars == 0 {
            return Err("max_rationale_chars must be greater than 0".to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CategorizerConfig::default();
        assert!(config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = CategorizerConfig {
            enabled: false,
            ..CategorizerConfig::default()
        };
        let parsed = CategorizerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_nested_call_policy() {
        let parsed = CategorizerConfig::from_toml("[call]\nmax_attempts = 5").unwrap();
        assert_eq!(parsed.call.max_attempts, 5);
        assert_eq!(parsed.call.timeout_secs, 120);
    }
}
