//! CLI command implementations

pub mod check;
pub mod generate;
pub mod presets;

use anyhow::{Context, Result};
use std::path::Path;
use stickwork_core::GenerationConfig;

/// Loads a configuration file, attaching the path to any error.
pub(crate) fn load_config(config_path: &str) -> Result<GenerationConfig> {
    GenerationConfig::from_path(Path::new(config_path))
        .with_context(|| format!("Failed to load config file: {}", config_path))
}
