//! Tom fills across the last two beats of a bar.
//!
//! The ascending build walks the toms from lowest to highest while the
//! velocity crescendos; the descending drop is its mirror image and is used
//! for release rather than tension.

use crate::beat::Beat;
use crate::candidate::{Candidate, FillRole, OnsetStrength};
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::operator::{candidate_id, lerp_velocity, Operator, OperatorFamily};
use crate::rng::{pick_sorted_indices, range_inclusive};

use super::{fill_role_at, REPEATED_FILL_FACTOR};

const MIN_HITS: u32 = 6;
const MAX_HITS: u32 = 12;
/// Thirty-second-note slots over two beats.
const SLOTS: usize = 16;
const SLOT_TICKS: i64 = Beat::TICKS_PER_BEAT / 8;
const SOFT_BAND: (u32, u32) = (55, 72);
const LOUD_BAND: (u32, u32) = (100, 120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TomFill {
    direction: FillDirection,
}

impl TomFill {
    pub fn ascending() -> Self {
        Self {
            direction: FillDirection::Ascending,
        }
    }

    pub fn descending() -> Self {
        Self {
            direction: FillDirection::Descending,
        }
    }

    pub fn direction(&self) -> FillDirection {
        self.direction
    }

    fn base_score(&self, ctx: &AgentContext) -> f64 {
        let drive = match self.direction {
            FillDirection::Ascending => ctx.tension,
            FillDirection::Descending => 1.0 - ctx.tension,
        };
        let boundary = match ctx.bars_until_section_end {
            0 => 0.3,
            1 => 0.1,
            _ => 0.0,
        };
        let mut score = 0.5 + 0.15 * drive + boundary;
        if ctx
            .recent_fill
            .as_ref()
            .is_some_and(|fill| fill.tag.as_deref() == Some(self.id()))
        {
            score *= REPEATED_FILL_FACTOR;
        }
        score.clamp(0.0, 1.0)
    }
}

impl Operator for TomFill {
    fn id(&self) -> &'static str {
        match self.direction {
            FillDirection::Ascending => "phrase.build_fill_ascending",
            FillDirection::Descending => "phrase.drop_fill_descending",
        }
    }

    fn family(&self) -> OperatorFamily {
        OperatorFamily::PhrasePunctuation
    }

    fn can_apply(&self, ctx: &AgentContext) -> bool {
        ctx.is_fill_window && ctx.beats_per_bar >= 2 && ctx.has_any_tom()
    }

    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError> {
        let mut toms = ctx.toms_low_to_high();
        if toms.is_empty() || ctx.beats_per_bar < 2 {
            return Ok(Vec::new());
        }
        if self.direction == FillDirection::Descending {
            toms.reverse();
        }

        let mut count_rng = ctx.rng_for(self.id(), 0);
        let count = range_inclusive(&mut count_rng, MIN_HITS, MAX_HITS) as usize;

        let mut position_rng = ctx.rng_for(self.id(), 1);
        let slots = pick_sorted_indices(&mut position_rng, SLOTS, count);

        let mut velocity_rng = ctx.rng_for(self.id(), 2);
        let soft = range_inclusive(&mut velocity_rng, SOFT_BAND.0, SOFT_BAND.1);
        let loud = range_inclusive(&mut velocity_rng, LOUD_BAND.0, LOUD_BAND.1);
        let (from, to) = match self.direction {
            FillDirection::Ascending => (soft, loud),
            FillDirection::Descending => (loud, soft),
        };

        let start = Beat::whole(ctx.beats_per_bar - 1);
        let count = slots.len();
        let mut candidates = Vec::with_capacity(count);
        for (i, slot) in slots.into_iter().enumerate() {
            let beat = Beat::from_ticks(start.ticks() + slot as i64 * SLOT_TICKS);
            let role = toms[i * toms.len() / count].clone();
            let strength = if beat.is_on_beat() {
                OnsetStrength::Strong
            } else {
                OnsetStrength::Offbeat
            };
            let t = if count > 1 {
                i as f64 / (count - 1) as f64
            } else {
                1.0
            };
            let mut candidate = Candidate::new(
                self.id(),
                candidate_id(self.id(), ctx.bar, i),
                ctx.bar,
                beat,
                role,
                strength,
                0.0,
            )?
            .with_velocity(lerp_velocity(from, to, t))
            .with_fill_role(fill_role_at(i, count));
            candidate.score = self.score(&candidate, ctx);
            candidates.push(candidate);
        }
        Ok(candidates)
    }

    fn score(&self, candidate: &Candidate, ctx: &AgentContext) -> f64 {
        let mut score = self.base_score(ctx);
        if candidate.fill_role == FillRole::FillEnd {
            score += 0.05;
        }
        score.clamp(0.0, 1.0)
    }
}
