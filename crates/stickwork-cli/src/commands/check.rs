//! Check command implementation
//!
//! Generates a performance and runs the sticking rules over it.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::process::ExitCode;
use stickwork_core::{GenerationConfig, StickingReport};

use super::load_config;

/// JSON output for the check command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutput {
    /// Whether the performance passed every enabled rule.
    pub success: bool,
    pub config_path: String,
    pub seed: u32,
    pub bars: usize,
    pub events: usize,
    /// Rule ids that were switched off for this run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_rules: Vec<String>,
    pub report: StickingReport,
}

/// Run the check command
///
/// # Arguments
/// * `config_path` - Path to the generation config (JSON)
/// * `disable_rules` - Sticking rule ids to disable
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 if no violations, 1 otherwise
pub fn run(config_path: &str, disable_rules: &[String], json_output: bool) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let output = check(&config, config_path, disable_rules)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize check output")?
        );
    } else {
        print_text_output(&output);
    }

    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Generates and validates without printing anything.
pub fn check(
    config: &GenerationConfig,
    config_path: &str,
    disable_rules: &[String],
) -> Result<CheckOutput> {
    let generator = config.generator()?;
    let mut memory = config.agent_memory()?;
    let performance = generator
        .generate_pass(&config.sections, config.seed, &mut memory)
        .with_context(|| format!("Generation failed for config: {}", config_path))?;

    let mut validator = generator.sticking_validator();
    for rule_id in disable_rules {
        validator.disable_rule(rule_id)?;
    }
    let events: Vec<_> = performance.events().cloned().collect();
    let report = validator.validate(&events, generator.model());

    Ok(CheckOutput {
        success: report.ok,
        config_path: config_path.to_string(),
        seed: performance.seed,
        bars: performance.bars.len(),
        events: performance.event_count(),
        disabled_rules: disable_rules.to_vec(),
        report,
    })
}

fn print_text_output(output: &CheckOutput) {
    println!("{} {}", "Checking:".cyan().bold(), output.config_path);
    println!(
        "{} seed {}, {} bars, {} events",
        "Performance:".dimmed(),
        output.seed,
        output.bars,
        output.events
    );
    for rule_id in &output.disabled_rules {
        println!("{} {}", "Disabled:".dimmed(), rule_id);
    }

    if output.report.violations.is_empty() {
        println!("{} no sticking violations", "PASS".green().bold());
        return;
    }

    for violation in &output.report.violations {
        println!(
            "  {} [{}] {}",
            "violation".yellow().bold(),
            violation.rule_id,
            violation.description
        );
        for location in &violation.locations {
            println!(
                "      bar {} beat {} {}",
                location.bar, location.beat, location.role
            );
        }
    }
    println!(
        "{} {} violation(s)",
        "FAIL".red().bold(),
        output.report.violations.len()
    );
}
