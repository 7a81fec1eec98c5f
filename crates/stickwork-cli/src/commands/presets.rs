//! Presets command implementation
//!
//! Lists the built-in limb presets and their role mappings.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::process::ExitCode;
use stickwork_core::{Limb, LimbModel, LimbPreset, Role};

/// One preset as printed by `stickwork presets --json`.
#[derive(Debug, Clone, Serialize)]
pub struct PresetListing {
    pub name: &'static str,
    pub mappings: BTreeMap<Role, Limb>,
}

/// Every built-in preset with its mapping.
pub fn listings() -> Vec<PresetListing> {
    LimbPreset::ALL
        .into_iter()
        .map(|preset| PresetListing {
            name: preset.as_str(),
            mappings: LimbModel::preset(preset)
                .mappings()
                .map(|(role, limb)| (role.clone(), limb))
                .collect(),
        })
        .collect()
}

/// Run the presets command
///
/// # Returns
/// Exit code: always 0
pub fn run(json_output: bool) -> Result<ExitCode> {
    let listings = listings();
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&listings).context("Failed to serialize presets")?
        );
        return Ok(ExitCode::SUCCESS);
    }

    for listing in &listings {
        println!("{}", listing.name.cyan().bold());
        for (role, limb) in &listing.mappings {
            println!("  {:<12} {}", role.as_str(), limb);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_both_presets() {
        let names: Vec<&str> = listings().iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["right_handed", "left_handed"]);
    }

    #[test]
    fn left_handed_swaps_hands_only() {
        let listings = listings();
        let right = &listings[0].mappings;
        let left = &listings[1].mappings;
        assert_eq!(right[&Role::SNARE], Limb::LeftHand);
        assert_eq!(left[&Role::SNARE], Limb::RightHand);
        assert_eq!(right[&Role::KICK], left[&Role::KICK]);
    }
}
