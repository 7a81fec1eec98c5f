//! Per-bar context handed to every operator.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::beat::Beat;
use crate::error::{require_bar, EngineError};
use crate::memory::FillShape;
use crate::rng::{create_stream_rng, stream_key};
use crate::role::Role;

/// Song section types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Intro,
    Verse,
    PreChorus,
    Chorus,
    Bridge,
    Solo,
    Breakdown,
    Outro,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Intro => "intro",
            SectionType::Verse => "verse",
            SectionType::PreChorus => "pre_chorus",
            SectionType::Chorus => "chorus",
            SectionType::Bridge => "bridge",
            SectionType::Solo => "solo",
            SectionType::Breakdown => "breakdown",
            SectionType::Outro => "outro",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of one bar (and beat) of the arrangement.
///
/// Operators only ever read it.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentContext {
    /// 1-based bar number.
    pub bar: u32,
    /// 1-based beat within the bar.
    pub beat: Beat,
    pub beats_per_bar: u32,
    pub section_type: SectionType,
    /// 0 at the start of the section, approaching 1 at its end.
    pub phrase_position: f64,
    /// Bars left in the section after this one (0 on the last bar).
    pub bars_until_section_end: u32,
    pub energy: f64,
    pub tension: f64,
    /// Motif presence / busyness in [0, 1].
    pub busyness: f64,
    /// Bar is eligible for fill-type operators.
    pub is_fill_window: bool,
    pub seed: u32,
    /// Key of the pseudo-random stream for this bar.
    pub stream_key: String,
    /// Roles the kit provides.
    pub available_roles: Arc<BTreeSet<Role>>,
    /// Shape of the most recent fill, if any.
    pub recent_fill: Option<FillShape>,
}

impl AgentContext {
    /// Starts a context for `bar` with neutral defaults.
    pub fn builder(bar: u32, section_type: SectionType) -> AgentContextBuilder {
        AgentContextBuilder {
            context: AgentContext {
                bar,
                beat: Beat::ONE,
                beats_per_bar: 4,
                section_type,
                phrase_position: 0.0,
                bars_until_section_end: 0,
                energy: 0.5,
                tension: 0.5,
                busyness: 0.5,
                is_fill_window: false,
                seed: 0,
                stream_key: format!("{}:{}", section_type, bar),
                available_roles: Arc::new(BTreeSet::new()),
                recent_fill: None,
            },
        }
    }

    /// Checks ranges of every field.
    pub fn validate(&self) -> Result<(), EngineError> {
        require_bar(self.bar)?;
        let invalid = |message: String| EngineError::InvalidContext {
            bar: self.bar,
            message,
        };
        if self.beats_per_bar == 0 {
            return Err(invalid("beats_per_bar must be > 0".to_string()));
        }
        if self.beat < Beat::ONE {
            return Err(invalid(format!("beat {} must be >= 1", self.beat)));
        }
        for (name, value) in [
            ("phrase_position", self.phrase_position),
            ("energy", self.energy),
            ("tension", self.tension),
            ("busyness", self.busyness),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} {} is outside [0, 1]", name, value)));
            }
        }
        Ok(())
    }

    /// First bar of a section.
    pub fn is_section_start(&self) -> bool {
        self.phrase_position <= 1e-9
    }

    /// Last bar of a section.
    pub fn is_section_end(&self) -> bool {
        self.bars_until_section_end == 0
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.available_roles.contains(role)
    }

    /// True when the kit has at least one tom. Does not allocate.
    pub fn has_any_tom(&self) -> bool {
        Role::TOMS_LOW_TO_HIGH.iter().any(|r| self.has_role(r))
    }

    /// Toms the kit provides, lowest pitch first.
    pub fn toms_low_to_high(&self) -> Vec<Role> {
        Role::TOMS_LOW_TO_HIGH
            .into_iter()
            .filter(|r| self.has_role(r))
            .collect()
    }

    /// Isolated random stream for one decision of one operator in this bar.
    ///
    /// Derived from `(seed, stream_key, bar, operator_id, index)` only.
    pub fn rng_for(&self, operator_id: &str, index: u32) -> Pcg32 {
        let key = format!("{}|{}", self.stream_key, stream_key(self.bar, operator_id, index));
        create_stream_rng(self.seed, &key)
    }

    /// First beat after the end of the bar (the next bar's downbeat).
    pub fn bar_end(&self) -> Beat {
        Beat::whole(self.beats_per_bar + 1)
    }
}

/// Builder for [`AgentContext`].
#[derive(Debug, Clone)]
pub struct AgentContextBuilder {
    context: AgentContext,
}

impl AgentContextBuilder {
    pub fn beat(mut self, beat: Beat) -> Self {
        self.context.beat = beat;
        self
    }

    pub fn beats_per_bar(mut self, beats: u32) -> Self {
        self.context.beats_per_bar = beats;
        self
    }

    pub fn phrase_position(mut self, position: f64) -> Self {
        self.context.phrase_position = position;
        self
    }

    pub fn bars_until_section_end(mut self, bars: u32) -> Self {
        self.context.bars_until_section_end = bars;
        self
    }

    pub fn energy(mut self, energy: f64) -> Self {
        self.context.energy = energy;
        self
    }

    pub fn tension(mut self, tension: f64) -> Self {
        self.context.tension = tension;
        self
    }

    pub fn busyness(mut self, busyness: f64) -> Self {
        self.context.busyness = busyness;
        self
    }

    pub fn fill_window(mut self, is_fill_window: bool) -> Self {
        self.context.is_fill_window = is_fill_window;
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.context.seed = seed;
        self
    }

    pub fn stream_key(mut self, key: impl Into<String>) -> Self {
        self.context.stream_key = key.into();
        self
    }

    pub fn available_roles(mut self, roles: Arc<BTreeSet<Role>>) -> Self {
        self.context.available_roles = roles;
        self
    }

    pub fn recent_fill(mut self, shape: Option<FillShape>) -> Self {
        self.context.recent_fill = shape;
        self
    }

    /// Validates and returns the context.
    pub fn build(self) -> Result<AgentContext, EngineError> {
        self.context.validate()?;
        Ok(self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_kit() -> Arc<BTreeSet<Role>> {
        Arc::new(BTreeSet::from([
            Role::KICK,
            Role::SNARE,
            Role::TOM_HIGH,
            Role::FLOOR_TOM,
        ]))
    }

    #[test]
    fn builder_defaults_are_valid() {
        let ctx = AgentContext::builder(1, SectionType::Verse).build().unwrap();
        assert_eq!(ctx.beat, Beat::ONE);
        assert!(ctx.is_section_start());
        assert!(ctx.is_section_end());
        assert_eq!(ctx.stream_key, "verse:1");
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(AgentContext::builder(0, SectionType::Verse).build().is_err());
        assert!(AgentContext::builder(1, SectionType::Verse)
            .energy(1.2)
            .build()
            .is_err());
        assert!(AgentContext::builder(1, SectionType::Verse)
            .beats_per_bar(0)
            .build()
            .is_err());
    }

    #[test]
    fn toms_follow_pitch_order_and_kit() {
        let ctx = AgentContext::builder(1, SectionType::Chorus)
            .available_roles(full_kit())
            .build()
            .unwrap();
        assert_eq!(ctx.toms_low_to_high(), vec![Role::FLOOR_TOM, Role::TOM_HIGH]);
        assert_eq!(ctx.bar_end(), Beat::whole(5));
    }

    #[test]
    fn rng_streams_depend_on_operator_and_index() {
        use rand::Rng;

        let ctx = AgentContext::builder(3, SectionType::Verse)
            .seed(11)
            .build()
            .unwrap();
        let draw = |op: &str, index: u32| -> Vec<u32> {
            let mut rng = ctx.rng_for(op, index);
            (0..4).map(|_| rng.gen()).collect()
        };
        assert_eq!(draw("a", 0), draw("a", 0));
        assert_ne!(draw("a", 0), draw("a", 1));
        assert_ne!(draw("a", 0), draw("b", 0));
    }
}
