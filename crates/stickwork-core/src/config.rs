//! Generation configuration loaded from JSON.
//!
//! Every field has a default, so `{}` is a valid (if silent) configuration.
//! Unknown fields are rejected at every level.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::EngineError;
use crate::generate::{Generator, Performance};
use crate::limb::{Limb, LimbModel, LimbPreset};
use crate::memory::{AgentMemory, MemoryConfig};
use crate::physicality::PhysicalityRules;
use crate::plan::SectionPlan;
use crate::role::Role;
use crate::sticking::StickingLimits;
use crate::style::StyleConfig;

/// Errors raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] EngineError),
}

/// Everything a generation pass needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub seed: u32,
    pub limb_preset: LimbPreset,
    /// Per-role limb overrides applied on top of the preset.
    pub limb_overrides: BTreeMap<Role, Limb>,
    pub physicality: PhysicalityRules,
    pub memory: MemoryConfig,
    pub sticking: StickingLimits,
    pub style: StyleConfig,
    pub sections: SectionPlan,
}

impl GenerationConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GenerationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.memory.validate()?;
        self.style.validate()?;
        self.sections.validate()?;
        for role in self.limb_overrides.keys() {
            if role.as_str().is_empty() {
                return Err(EngineError::EmptyIdentifier {
                    field: "limb_overrides role",
                });
            }
        }
        Ok(())
    }

    /// The preset with any overrides applied.
    pub fn limb_model(&self) -> Result<LimbModel, EngineError> {
        LimbModel::preset(self.limb_preset).with_overrides(&self.limb_overrides)
    }

    pub fn generator(&self) -> Result<Generator, EngineError> {
        Ok(
            Generator::new(self.limb_model()?, self.physicality, self.style.clone())?
                .with_sticking_limits(self.sticking),
        )
    }

    /// A fresh memory for one pass.
    pub fn agent_memory(&self) -> Result<AgentMemory, EngineError> {
        AgentMemory::new(self.memory)
    }

    /// Runs a complete pass over the configured sections.
    pub fn generate(&self) -> Result<Performance, EngineError> {
        let generator = self.generator()?;
        let mut memory = self.agent_memory()?;
        generator.generate_pass(&self.sections, self.seed, &mut memory)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::SectionType;
    use crate::memory::DecayCurve;
    use crate::physicality::StrictnessLevel;

    const CONFIG: &str = r#"{
        "seed": 7,
        "limb_preset": "left_handed",
        "limb_overrides": { "ride": "left_hand" },
        "physicality": { "strictness": "strict", "max_hits_per_bar": 20 },
        "memory": { "window_size": 4, "decay": { "curve": "linear" } },
        "sticking": { "max_ghost_notes_per_bar": 6 },
        "style": {
            "operator_weights": { "phrase.crash_on_one": 1.2 },
            "disabled_operators": ["groove.ghost_notes"]
        },
        "sections": [
            { "section_type": "verse", "bars": 4, "energy": 0.6 },
            { "section_type": "chorus", "bars": 4, "fill_window_bars": 2 }
        ]
    }"#;

    #[test]
    fn empty_object_uses_defaults() {
        let config = GenerationConfig::from_json("{}").unwrap();
        assert_eq!(config, GenerationConfig::default());
        assert_eq!(config.physicality.max_hits_per_bar, 32);
        assert_eq!(config.memory.window_size, 8);
        assert_eq!(config.sticking.max_consecutive_same_limb, 5);
        assert!(config.generate().unwrap().bars.is_empty());
    }

    #[test]
    fn parses_full_config() {
        let config = GenerationConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.limb_preset, LimbPreset::LeftHanded);
        assert_eq!(config.physicality.strictness, StrictnessLevel::Strict);
        assert_eq!(config.memory.decay, DecayCurve::Linear);
        assert_eq!(config.sticking.max_ghost_notes_per_bar, 6);
        assert_eq!(config.sticking.max_consecutive_same_limb, 5);
        assert_eq!(config.sections.total_bars(), 8);
        assert_eq!(config.sections.sections()[1].section_type, SectionType::Chorus);

        let model = config.limb_model().unwrap();
        assert_eq!(model.required_limb(&Role::RIDE), Some(Limb::LeftHand));
        assert_eq!(model.required_limb(&Role::SNARE), Some(Limb::RightHand));
    }

    #[test]
    fn generated_pass_honours_config() {
        let config = GenerationConfig::from_json(CONFIG).unwrap();
        let performance = config.generate().unwrap();
        assert_eq!(performance.seed, 7);
        assert_eq!(performance.bars.len(), 8);
        assert!(performance
            .events()
            .all(|c| c.operator_id != "groove.ghost_notes"));
        assert!(performance.bars.iter().all(|b| b.candidates.len() <= 20));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(matches!(
            GenerationConfig::from_json(r#"{"sed": 1}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(GenerationConfig::from_json(r#"{"memory": {"window": 3}}"#).is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        let err = GenerationConfig::from_json(r#"{"memory": {"window_size": 0}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(EngineError::InvalidWindowSize)
        ));
        assert!(GenerationConfig::from_json(
            r#"{"memory": {"decay": {"curve": "exponential", "factor": 1.5}}}"#
        )
        .is_err());
        assert!(GenerationConfig::from_json(
            r#"{"sections": [{"section_type": "verse", "bars": 0}]}"#
        )
        .is_err());
        assert!(GenerationConfig::from_json(r#"{"limb_preset": "ambidextrous"}"#).is_err());
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, CONFIG).unwrap();
        assert_eq!(
            GenerationConfig::from_path(&path).unwrap(),
            GenerationConfig::from_json(CONFIG).unwrap()
        );

        assert!(matches!(
            GenerationConfig::from_path(&dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn round_trips_through_json() {
        let config = GenerationConfig::from_json(CONFIG).unwrap();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(GenerationConfig::from_json(&json).unwrap(), config);
    }
}
