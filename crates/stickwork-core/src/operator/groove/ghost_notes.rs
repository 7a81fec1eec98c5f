use crate::beat::Beat;
use crate::candidate::{Candidate, OnsetStrength};
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::operator::{candidate_id, Operator, OperatorFamily};
use crate::rng::{pick_sorted_indices, range_inclusive};
use crate::role::Role;

const VELOCITY_BAND: (u32, u32) = (28, 45);

/// Quiet snare strokes on the "e" and "a" of each beat.
///
/// How many land is `slots × busyness × density / 2`, rounded, so a fully
/// busy and dense bar of four fills half of its eight slots.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostNotes {
    density: f64,
}

impl GhostNotes {
    pub fn new(density: f64) -> Self {
        Self {
            density: density.clamp(0.0, 1.0),
        }
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    fn slots(ctx: &AgentContext) -> Vec<Beat> {
        (1..=ctx.beats_per_bar)
            .flat_map(|beat| {
                let beat = Beat::whole(beat);
                [beat.plus_sixteenths(1), beat.plus_sixteenths(3)]
            })
            .collect()
    }

    fn count(&self, ctx: &AgentContext, slots: usize) -> usize {
        (slots as f64 * ctx.busyness * self.density * 0.5).round() as usize
    }
}

impl Operator for GhostNotes {
    fn id(&self) -> &'static str {
        "groove.ghost_notes"
    }

    fn family(&self) -> OperatorFamily {
        OperatorFamily::Timekeeping
    }

    fn can_apply(&self, ctx: &AgentContext) -> bool {
        !ctx.is_fill_window
            && ctx.has_role(&Role::SNARE)
            && self.count(ctx, 2 * ctx.beats_per_bar as usize) > 0
    }

    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError> {
        if ctx.is_fill_window {
            return Ok(Vec::new());
        }
        let slots = Self::slots(ctx);
        let count = self.count(ctx, slots.len());

        let mut position_rng = ctx.rng_for(self.id(), 0);
        let picked = pick_sorted_indices(&mut position_rng, slots.len(), count);

        let mut velocity_rng = ctx.rng_for(self.id(), 1);
        let mut candidates = Vec::with_capacity(picked.len());
        for (i, slot) in picked.into_iter().enumerate() {
            let velocity = range_inclusive(&mut velocity_rng, VELOCITY_BAND.0, VELOCITY_BAND.1);
            let mut candidate = Candidate::new(
                self.id(),
                candidate_id(self.id(), ctx.bar, i),
                ctx.bar,
                slots[slot],
                Role::SNARE,
                OnsetStrength::Ghost,
                0.0,
            )?
            .with_velocity(velocity as u8);
            candidate.score = self.score(&candidate, ctx);
            candidates.push(candidate);
        }
        Ok(candidates)
    }

    fn score(&self, _candidate: &Candidate, ctx: &AgentContext) -> f64 {
        (0.35 + 0.2 * ctx.busyness).clamp(0.0, 1.0)
    }
}
