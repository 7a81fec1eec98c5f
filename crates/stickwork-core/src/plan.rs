//! Section plans: the arrangement a pass is generated against.
//!
//! A plan is an ordered list of sections. Bars are numbered from 1 across
//! the whole plan, and each bar gets one [`AgentContext`].

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::{AgentContext, SectionType};
use crate::error::EngineError;
use crate::limb::LimbModel;
use crate::role::Role;

fn default_level() -> f64 {
    0.5
}

fn default_beats_per_bar() -> u32 {
    4
}

fn default_fill_window_bars() -> u32 {
    1
}

/// One section of the arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionSpec {
    pub section_type: SectionType,
    pub bars: u32,
    #[serde(default = "default_level")]
    pub energy: f64,
    #[serde(default = "default_level")]
    pub tension: f64,
    #[serde(default = "default_level")]
    pub busyness: f64,
    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: u32,
    /// Trailing bars of the section that are marked as a fill window.
    #[serde(default = "default_fill_window_bars")]
    pub fill_window_bars: u32,
}

impl SectionSpec {
    /// A section with neutral levels, 4/4 and a one-bar fill window.
    pub fn new(section_type: SectionType, bars: u32) -> Self {
        Self {
            section_type,
            bars,
            energy: default_level(),
            tension: default_level(),
            busyness: default_level(),
            beats_per_bar: default_beats_per_bar(),
            fill_window_bars: default_fill_window_bars(),
        }
    }

    pub fn with_levels(mut self, energy: f64, tension: f64, busyness: f64) -> Self {
        self.energy = energy;
        self.tension = tension;
        self.busyness = busyness;
        self
    }

    pub fn with_beats_per_bar(mut self, beats: u32) -> Self {
        self.beats_per_bar = beats;
        self
    }

    pub fn with_fill_window_bars(mut self, bars: u32) -> Self {
        self.fill_window_bars = bars;
        self
    }

    fn validate(&self, index: usize) -> Result<(), EngineError> {
        let invalid = |message: String| EngineError::InvalidSectionPlan { index, message };
        if self.bars == 0 {
            return Err(invalid("section has no bars".to_string()));
        }
        if self.beats_per_bar == 0 {
            return Err(invalid("beats_per_bar must be > 0".to_string()));
        }
        for (name, value) in [
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
}

/// Ordered sections of a song.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionPlan {
    sections: Vec<SectionSpec>,
}

impl SectionPlan {
    /// Builds and validates a plan.
    pub fn new(sections: Vec<SectionSpec>) -> Result<Self, EngineError> {
        let plan = Self { sections };
        plan.validate()?;
        Ok(plan)
    }

    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn total_bars(&self) -> u32 {
        self.sections.iter().map(|s| s.bars).sum()
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (index, section) in self.sections.iter().enumerate() {
            section.validate(index)?;
        }
        Ok(())
    }

    /// One context per bar, in bar order.
    ///
    /// `recent_fill` is left empty; the generator fills it from memory when
    /// the bar is played.
    pub fn contexts(
        &self,
        seed: u32,
        available_roles: Arc<BTreeSet<Role>>,
    ) -> Result<Vec<AgentContext>, EngineError> {
        self.validate()?;
        let mut contexts = Vec::with_capacity(self.total_bars() as usize);
        let mut bar = 1;
        for section in &self.sections {
            let window = section.fill_window_bars.min(section.bars);
            for bar_in_section in 1..=section.bars {
                let remaining = section.bars - bar_in_section;
                let ctx = AgentContext::builder(bar, section.section_type)
                    .beats_per_bar(section.beats_per_bar)
                    .phrase_position((bar_in_section - 1) as f64 / section.bars as f64)
                    .bars_until_section_end(remaining)
                    .energy(section.energy)
                    .tension(section.tension)
                    .busyness(section.busyness)
                    .fill_window(remaining < window)
                    .seed(seed)
                    .available_roles(Arc::clone(&available_roles))
                    .build()?;
                contexts.push(ctx);
                bar += 1;
            }
        }
        Ok(contexts)
    }
}

/// Roles a kit offers: everything the limb model maps, plus the crash.
pub fn kit_roles(model: &LimbModel) -> Arc<BTreeSet<Role>> {
    let mut roles: BTreeSet<Role> = model.roles().cloned().collect();
    roles.insert(Role::CRASH);
    Arc::new(roles)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn plan() -> SectionPlan {
        SectionPlan::new(vec![
            SectionSpec::new(SectionType::Verse, 4),
            SectionSpec::new(SectionType::Chorus, 2).with_fill_window_bars(2),
        ])
        .unwrap()
    }

    #[test]
    fn contexts_are_numbered_across_sections() {
        let contexts = plan()
            .contexts(9, kit_roles(&LimbModel::right_handed()))
            .unwrap();
        let bars: Vec<u32> = contexts.iter().map(|c| c.bar).collect();
        assert_eq!(bars, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(contexts[4].section_type, SectionType::Chorus);
        assert_eq!(contexts[4].stream_key, "chorus:5");
        assert!(contexts.iter().all(|c| c.seed == 9));
    }

    #[test]
    fn phrase_position_and_boundaries() {
        let contexts = plan()
            .contexts(0, kit_roles(&LimbModel::right_handed()))
            .unwrap();
        let positions: Vec<f64> = contexts[..4].iter().map(|c| c.phrase_position).collect();
        assert_eq!(positions, vec![0.0, 0.25, 0.5, 0.75]);
        assert!(contexts[0].is_section_start());
        assert!(contexts[3].is_section_end());
        assert!(contexts[4].is_section_start());
        assert_eq!(contexts[1].bars_until_section_end, 2);
    }

    #[test]
    fn fill_windows_cover_trailing_bars() {
        let contexts = plan()
            .contexts(0, kit_roles(&LimbModel::right_handed()))
            .unwrap();
        let windows: Vec<bool> = contexts.iter().map(|c| c.is_fill_window).collect();
        assert_eq!(windows, vec![false, false, false, true, true, true]);
    }

    #[test]
    fn zero_fill_window_disables_fills() {
        let plan =
            SectionPlan::new(vec![SectionSpec::new(SectionType::Intro, 2).with_fill_window_bars(0)])
                .unwrap();
        let contexts = plan.contexts(0, kit_roles(&LimbModel::empty())).unwrap();
        assert!(contexts.iter().all(|c| !c.is_fill_window));
    }

    #[test]
    fn kit_roles_include_crash() {
        let roles = kit_roles(&LimbModel::empty());
        assert_eq!(roles.iter().cloned().collect::<Vec<_>>(), vec![Role::CRASH]);
        assert!(kit_roles(&LimbModel::right_handed()).contains(&Role::FLOOR_TOM));
    }

    #[test]
    fn invalid_sections_are_rejected() {
        let err = SectionPlan::new(vec![
            SectionSpec::new(SectionType::Verse, 4),
            SectionSpec::new(SectionType::Bridge, 0),
        ])
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidSectionPlan { index: 1, .. }));

        assert!(SectionPlan::new(vec![
            SectionSpec::new(SectionType::Verse, 4).with_levels(1.5, 0.5, 0.5)
        ])
        .is_err());
        assert!(SectionPlan::new(vec![
            SectionSpec::new(SectionType::Verse, 4).with_beats_per_bar(0)
        ])
        .is_err());
    }

    #[test]
    fn section_spec_defaults_from_json() {
        let spec: SectionSpec =
            serde_json::from_str(r#"{"section_type": "pre_chorus", "bars": 8}"#).unwrap();
        assert_eq!(spec, SectionSpec::new(SectionType::PreChorus, 8));
    }
}
