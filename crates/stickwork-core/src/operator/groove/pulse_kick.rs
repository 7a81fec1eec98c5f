use crate::beat::Beat;
use crate::candidate::{Candidate, OnsetStrength};
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::operator::{candidate_id, Operator, OperatorFamily};
use crate::role::Role;

/// Kick on one, and on three in bars of four or more beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseKick;

impl PulseKick {
    fn beats(ctx: &AgentContext) -> Vec<u32> {
        if ctx.beats_per_bar >= 4 {
            vec![1, 3]
        } else {
            vec![1]
        }
    }
}

impl Operator for PulseKick {
    fn id(&self) -> &'static str {
        "groove.pulse_kick"
    }

    fn family(&self) -> OperatorFamily {
        OperatorFamily::Timekeeping
    }

    fn can_apply(&self, ctx: &AgentContext) -> bool {
        ctx.has_role(&Role::KICK)
    }

    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError> {
        let mut candidates = Vec::with_capacity(2);
        for (i, beat) in Self::beats(ctx).into_iter().enumerate() {
            let velocity = if beat == 1 { 104 } else { 96 };
            let mut candidate = Candidate::new(
                self.id(),
                candidate_id(self.id(), ctx.bar, i),
                ctx.bar,
                Beat::whole(beat),
                Role::KICK,
                OnsetStrength::Downbeat,
                0.0,
            )?
            .with_velocity(velocity);
            candidate.score = self.score(&candidate, ctx);
            candidates.push(candidate);
        }
        Ok(candidates)
    }

    fn score(&self, candidate: &Candidate, ctx: &AgentContext) -> f64 {
        // Leave room for stop-time and setup kicks inside a fill window.
        if ctx.is_fill_window && candidate.beat != Beat::ONE {
            0.55
        } else {
            0.85
        }
    }
}
