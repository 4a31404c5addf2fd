//! Conflict detection configuration

use serde::{Deserialize, Serialize};

/// Thresholds for the conflict rules
///
/// # Examples
///
/// ```
/// use factsheet_reconciler::ConflictConfig;
///
/// let config = ConflictConfig::default();
/// assert_eq!(config.tolerance, 0.02);
///
/// let strict = ConflictConfig::strict();
/// assert!(strict.tolerance < config.tolerance);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Relative spread (hi - lo) / lo at which values conflict
    /// Default: 0.02 (2%)
    pub tolerance: f64,

    /// How close hi / lo must be to 10, relative to 10, to count as a decimal shift
    /// Default: 0.05 (ratios 9.5 to 10.5)
    pub magnitude_epsilon: f64,

    /// Flag clusters mixing negative and positive values
    pub check_sign: bool,

    /// Flag categorical clusters whose values disagree
    pub check_categorical: bool,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            magnitude_epsilon: 0.05,
            check_sign: true,
            check_categorical: true,
        }
    }
}

impl ConflictConfig {
    /// Tighter thresholds, for reports with precise tables
    pub fn strict() -> Self {
        Self {
            tolerance: 0.005,
            ..Self::default()
        }
    }

    /// Numeric rules only
    pub fn numeric_only() -> Self {
        Self {
            check_sign: false,
            check_categorical: false,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(format!("tolerance must be >= 0, got {}", self.tolerance));
        }
        if !self.magnitude_epsilon.is_finite() || !(0.0..0.5).contains(&self.magnitude_epsilon) {
            return Err(format!(
                "magnitude_epsilon must be in [0, 0.5), got {}",
                self.magnitude_epsilon
            ));
        }
        Ok(())
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
