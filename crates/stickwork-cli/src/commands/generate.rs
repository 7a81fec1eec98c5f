//! Generate command implementation
//!
//! Runs a full generation pass and prints the performance as JSON.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use stickwork_core::Performance;
use tracing::info;

use super::load_config;

/// Options for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Overrides the configured seed.
    pub seed: Option<u32>,
    /// Emit only the bars array (no signatures, no seed).
    pub bars_only: bool,
    /// Write to this file instead of stdout.
    pub output: Option<String>,
    /// Pretty-print the output JSON.
    pub pretty: bool,
}

/// Run the generate command
///
/// # Arguments
/// * `config_path` - Path to the generation config (JSON)
/// * `options` - Output options
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(config_path: &str, options: &GenerateOptions) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    if config.sections.is_empty() {
        eprintln!(
            "{}: {} has no sections; the performance will be empty",
            "warning".yellow().bold(),
            config_path
        );
    }

    let performance = config
        .generate()
        .with_context(|| format!("Generation failed for config: {}", config_path))?;
    info!(
        seed = performance.seed,
        events = performance.event_count(),
        "performance generated"
    );

    let json = render(&performance, options.bars_only, options.pretty)?;
    match &options.output {
        Some(path) => {
            std::fs::write(Path::new(path), format!("{}\n", json))
                .with_context(|| format!("Failed to write output file: {}", path))?;
            eprintln!(
                "{} {} bars, {} events -> {}",
                "Generated".green().bold(),
                performance.bars.len(),
                performance.event_count(),
                path
            );
        }
        None => println!("{}", json),
    }

    Ok(ExitCode::SUCCESS)
}

/// Serializes the performance (or just its bars).
pub fn render(performance: &Performance, bars_only: bool, pretty: bool) -> Result<String> {
    if bars_only {
        to_json(&performance.bars, pretty)
    } else {
        to_json(performance, pretty)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialize performance to JSON")
}
