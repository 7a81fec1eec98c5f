//! Configurations and candidate builders shared by the integration tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use stickwork_core::{
    AgentContext, Beat, Candidate, GenerationConfig, LimbModel, OnsetStrength, Role, SectionType,
};

/// A short song touching every section boundary case: a one-bar intro, a
/// verse with a two-bar fill window and a chorus into an outro.
pub const SONG_CONFIG: &str = r#"{
    "seed": 2024,
    "sections": [
        { "section_type": "intro", "bars": 1, "energy": 0.3 },
        {
            "section_type": "verse",
            "bars": 8,
            "energy": 0.5,
            "busyness": 0.6,
            "fill_window_bars": 2
        },
        { "section_type": "chorus", "bars": 8, "energy": 0.9, "tension": 0.7, "busyness": 0.8 },
        { "section_type": "outro", "bars": 2, "energy": 0.4 }
    ]
}"#;

/// Parses [`SONG_CONFIG`].
pub fn song_config() -> GenerationConfig {
    GenerationConfig::from_json(SONG_CONFIG).expect("fixture config is valid")
}

/// `song_config` with a different seed.
pub fn song_config_with_seed(seed: u32) -> GenerationConfig {
    let mut config = song_config();
    config.seed = seed;
    config
}

/// Every role the right-handed kit offers, plus the crash.
pub fn full_kit() -> Arc<BTreeSet<Role>> {
    let mut roles: BTreeSet<Role> = LimbModel::right_handed().roles().cloned().collect();
    roles.insert(Role::CRASH);
    Arc::new(roles)
}

/// A mid-verse context on `bar`.
pub fn verse_context(bar: u32) -> AgentContext {
    AgentContext::builder(bar, SectionType::Verse)
        .bars_until_section_end(4)
        .available_roles(full_kit())
        .build()
        .expect("fixture context is valid")
}

/// A plain candidate from `operator_id` at whole beat `beat`.
pub fn hit(operator_id: &str, index: usize, beat: u32, role: Role, score: f64) -> Candidate {
    Candidate::new(
        operator_id,
        format!("{}:1:{}", operator_id, index),
        1,
        Beat::whole(beat),
        role,
        OnsetStrength::Strong,
        score,
    )
    .expect("fixture candidate is valid")
}
