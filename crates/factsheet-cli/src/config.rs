//! Configuration loading for the CLI.

use crate::error::{CliError, Result};
use factsheet_pipeline::PipelineConfig;
use std::path::{Path, PathBuf};

/// Default configuration file: `~/.factsheet/config.toml`.
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".factsheet").join("config.toml"))
}

/// Load the pipeline configuration.
///
/// An explicit path must exist. Without one, the default file is used when
/// present and built-in defaults otherwise. `FACTSHEET_*` environment
/// variables are applied last, then the result is validated.
pub fn load(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let mut config = match explicit {
        Some(path) => PipelineConfig::from_file(path).map_err(CliError::Config)?,
        None => match default_path() {
            Some(path) if path.exists() => PipelineConfig::from_file(&path).map_err(CliError::Config)?,
            _ => PipelineConfig::default(),
        },
    };

    config.apply_env().map_err(CliError::Config)?;
    config.validate().map_err(CliError::Config)?;
    Ok(config)
}
