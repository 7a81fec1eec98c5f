//! Turnaround fills on the sixteenth grid.
//!
//! The first and last grid points of the pool are always played; the rest
//! of the hits are a seeded pick from the interior. On-beat hits are accents
//! (toms from high to low, or snare on a tom-less kit); everything else is a
//! snare ghost.

use crate::beat::Beat;
use crate::candidate::{Articulation, Candidate, OnsetStrength};
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::operator::{candidate_id, Operator, OperatorFamily};
use crate::rng::{pick_sorted_indices, range_inclusive};
use crate::role::Role;

use super::{fill_role_at, sixteenth_grid, REPEATED_FILL_FACTOR};

const ACCENT_BAND: (u32, u32) = (100, 118);
const GHOST_BAND: (u32, u32) = (32, 48);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnaroundSpan {
    /// Last two beats of the bar.
    Short,
    /// The whole bar. Only on the true last bar of a section.
    FullBar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnaroundFill {
    span: TurnaroundSpan,
}

impl TurnaroundFill {
    pub fn short() -> Self {
        Self {
            span: TurnaroundSpan::Short,
        }
    }

    pub fn full() -> Self {
        Self {
            span: TurnaroundSpan::FullBar,
        }
    }

    pub fn span(&self) -> TurnaroundSpan {
        self.span
    }

    fn min_beats(&self) -> u32 {
        match self.span {
            TurnaroundSpan::Short => 2,
            TurnaroundSpan::FullBar => 3,
        }
    }

    fn hit_range(&self) -> (u32, u32) {
        match self.span {
            TurnaroundSpan::Short => (4, 6),
            TurnaroundSpan::FullBar => (8, 12),
        }
    }

    /// Grid points the fill may use.
    pub fn pool(&self, ctx: &AgentContext) -> Vec<Beat> {
        match self.span {
            TurnaroundSpan::Short => sixteenth_grid(Beat::whole(ctx.beats_per_bar - 1), 2),
            TurnaroundSpan::FullBar => sixteenth_grid(Beat::ONE, ctx.beats_per_bar),
        }
    }
}

impl Operator for TurnaroundFill {
    fn id(&self) -> &'static str {
        match self.span {
            TurnaroundSpan::Short => "phrase.turnaround_short",
            TurnaroundSpan::FullBar => "phrase.turnaround_full",
        }
    }

    fn family(&self) -> OperatorFamily {
        OperatorFamily::PhrasePunctuation
    }

    fn can_apply(&self, ctx: &AgentContext) -> bool {
        let boundary_ok = match self.span {
            TurnaroundSpan::Short => true,
            TurnaroundSpan::FullBar => ctx.is_section_end(),
        };
        ctx.is_fill_window
            && boundary_ok
            && ctx.beats_per_bar >= self.min_beats()
            && ctx.has_role(&Role::SNARE)
    }

    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError> {
        if ctx.beats_per_bar < self.min_beats() {
            return Ok(Vec::new());
        }
        let pool = self.pool(ctx);
        let (min_hits, max_hits) = self.hit_range();

        let mut rng = ctx.rng_for(self.id(), 0);
        let count = (range_inclusive(&mut rng, min_hits, max_hits) as usize).min(pool.len());

        // First and last always; the interior is a seeded pick.
        let last = pool.len() - 1;
        let mut selected = vec![0];
        selected.extend(
            pick_sorted_indices(&mut rng, last - 1, count.saturating_sub(2))
                .into_iter()
                .map(|i| i + 1),
        );
        selected.push(last);

        let mut accent_toms = ctx.toms_low_to_high();
        accent_toms.reverse();
        let mut accent_index = 0;

        let mut velocity_rng = ctx.rng_for(self.id(), 1);
        let count = selected.len();
        let mut candidates = Vec::with_capacity(count);
        for (i, slot) in selected.into_iter().enumerate() {
            let beat = pool[slot];
            let (role, strength, velocity, articulation) = if beat.is_on_beat() {
                let role = if accent_toms.is_empty() {
                    Role::SNARE
                } else {
                    accent_toms[accent_index % accent_toms.len()].clone()
                };
                accent_index += 1;
                (
                    role,
                    OnsetStrength::Strong,
                    range_inclusive(&mut velocity_rng, ACCENT_BAND.0, ACCENT_BAND.1),
                    Some(Articulation::Accent),
                )
            } else {
                (
                    Role::SNARE,
                    OnsetStrength::Ghost,
                    range_inclusive(&mut velocity_rng, GHOST_BAND.0, GHOST_BAND.1),
                    None,
                )
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
            .with_velocity(velocity as u8)
            .with_fill_role(fill_role_at(i, count));
            if let Some(articulation) = articulation {
                candidate = candidate.with_articulation(articulation);
            }
            candidate.score = self.score(&candidate, ctx);
            candidates.push(candidate);
        }
        Ok(candidates)
    }

    fn score(&self, candidate: &Candidate, ctx: &AgentContext) -> f64 {
        let mut score = match self.span {
            TurnaroundSpan::Short => 0.5 + 0.2 * ctx.tension,
            TurnaroundSpan::FullBar => 0.45 + 0.3 * ctx.tension,
        };
        if ctx.is_section_end() {
            score += 0.1;
        }
        if candidate.strength == OnsetStrength::Ghost {
            score -= 0.1;
        }
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
