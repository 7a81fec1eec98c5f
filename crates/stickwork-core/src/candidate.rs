//! Candidate events proposed by operators.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::beat::Beat;
use crate::error::{require_bar, require_non_empty, EngineError};
use crate::role::Role;

/// Onset-strength classification used for velocity shaping downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnsetStrength {
    Downbeat,
    Backbeat,
    Offbeat,
    Ghost,
    Pickup,
    Strong,
}

/// Articulation hint for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Articulation {
    Open,
    Closed,
    Accent,
    Rimshot,
    Choke,
}

/// Position of a candidate within a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FillRole {
    #[default]
    None,
    Setup,
    FillStart,
    FillBody,
    FillEnd,
}

impl FillRole {
    /// True for the start/body/end of an actual fill (setup hits excluded).
    pub fn is_fill(&self) -> bool {
        matches!(self, FillRole::FillStart | FillRole::FillBody | FillRole::FillEnd)
    }
}

/// A proposed, not-yet-committed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// 1-based bar number.
    pub bar: u32,
    /// Position within the bar.
    pub beat: Beat,
    pub role: Role,
    pub strength: OnsetStrength,
    /// Desirability in [0, 1].
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_hint: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articulation: Option<Articulation>,
    #[serde(default)]
    pub fill_role: FillRole,
    /// Id of the proposing operator; first tie-break key.
    pub operator_id: String,
    /// Id unique within the operator's output; second tie-break key.
    pub candidate_id: String,
    /// Protected candidates are never removed by conflict or density resolution.
    #[serde(default)]
    pub protected: bool,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl Candidate {
    /// Creates a candidate, checking the bar and score invariants.
    pub fn new(
        operator_id: impl Into<String>,
        candidate_id: impl Into<String>,
        bar: u32,
        beat: Beat,
        role: Role,
        strength: OnsetStrength,
        score: f64,
    ) -> Result<Self, EngineError> {
        let candidate = Self {
            bar,
            beat,
            role,
            strength,
            score,
            velocity_hint: None,
            articulation: None,
            fill_role: FillRole::None,
            operator_id: operator_id.into(),
            candidate_id: candidate_id.into(),
            protected: false,
            tags: BTreeSet::new(),
        };
        candidate.validate()?;
        Ok(candidate)
    }

    /// Checks every invariant a candidate must hold.
    pub fn validate(&self) -> Result<(), EngineError> {
        require_bar(self.bar)?;
        require_non_empty(&self.operator_id, "operator_id")?;
        require_non_empty(&self.candidate_id, "candidate_id")?;
        require_non_empty(self.role.as_str(), "role")?;
        if !(0.0..=1.0).contains(&self.score) {
            return Err(EngineError::ScoreOutOfRange {
                what: format!("candidate '{}'", self.candidate_id),
                score: self.score,
            });
        }
        Ok(())
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity_hint = Some(velocity.min(127));
        self
    }

    pub fn with_articulation(mut self, articulation: Articulation) -> Self {
        self.articulation = Some(articulation);
        self
    }

    pub fn with_fill_role(mut self, fill_role: FillRole) -> Self {
        self.fill_role = fill_role;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Marks the candidate as protected.
    pub fn protect(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn is_ghost(&self) -> bool {
        self.strength == OnsetStrength::Ghost
    }
}

/// Survival order: higher score first, then operator id ascending, then
/// candidate id ascending. Total for any set of distinct candidate ids.
pub fn survival_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.operator_id.cmp(&b.operator_id))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

/// Stable time order: bar, beat, role, then ids.
pub fn time_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.bar
        .cmp(&b.bar)
        .then_with(|| a.beat.cmp(&b.beat))
        .then_with(|| a.role.cmp(&b.role))
        .then_with(|| a.operator_id.cmp(&b.operator_id))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(op: &str, id: &str, score: f64) -> Candidate {
        Candidate::new(op, id, 1, Beat::whole(1), Role::SNARE, OnsetStrength::Backbeat, score)
            .unwrap()
    }

    #[test]
    fn rejects_bad_invariants() {
        let beat = Beat::whole(1);
        assert!(matches!(
            Candidate::new("op", "c", 0, beat, Role::KICK, OnsetStrength::Downbeat, 0.5),
            Err(EngineError::InvalidBarNumber { bar: 0 })
        ));
        assert!(matches!(
            Candidate::new("op", "c", 1, beat, Role::KICK, OnsetStrength::Downbeat, 1.5),
            Err(EngineError::ScoreOutOfRange { .. })
        ));
        assert!(matches!(
            Candidate::new("", "c", 1, beat, Role::KICK, OnsetStrength::Downbeat, 0.5),
            Err(EngineError::EmptyIdentifier { field: "operator_id" })
        ));
    }

    #[test]
    fn survival_order_prefers_score_then_operator() {
        let high = candidate("zeta", "a", 0.9);
        let tie_a = candidate("alpha", "b", 0.5);
        let tie_b = candidate("beta", "a", 0.5);
        let mut items = vec![tie_b.clone(), high.clone(), tie_a.clone()];
        items.sort_by(survival_order);
        assert_eq!(items, vec![high, tie_a, tie_b]);
    }

    #[test]
    fn velocity_is_clamped_to_midi_range() {
        let c = candidate("op", "c", 0.5).with_velocity(200);
        assert_eq!(c.velocity_hint, Some(127));
    }

    #[test]
    fn fill_role_classification() {
        assert!(FillRole::FillBody.is_fill());
        assert!(!FillRole::Setup.is_fill());
        assert!(!FillRole::None.is_fill());
    }
}
