use crate::beat::Beat;
use crate::candidate::{Candidate, OnsetStrength};
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::operator::{candidate_id, Operator, OperatorFamily};
use crate::role::Role;

/// Snare on every even beat. Protected: the filter never removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backbeat;

impl Operator for Backbeat {
    fn id(&self) -> &'static str {
        "groove.backbeat"
    }

    fn family(&self) -> OperatorFamily {
        OperatorFamily::Timekeeping
    }

    fn can_apply(&self, ctx: &AgentContext) -> bool {
        ctx.beats_per_bar >= 2 && ctx.has_role(&Role::SNARE)
    }

    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError> {
        (2..=ctx.beats_per_bar)
            .step_by(2)
            .enumerate()
            .map(|(i, beat)| -> Result<Candidate, EngineError> {
                let mut candidate = Candidate::new(
                    self.id(),
                    candidate_id(self.id(), ctx.bar, i),
                    ctx.bar,
                    Beat::whole(beat),
                    Role::SNARE,
                    OnsetStrength::Backbeat,
                    0.0,
                )?
                .with_velocity(110)
                .protect();
                candidate.score = self.score(&candidate, ctx);
                Ok(candidate)
            })
            .collect()
    }

    fn score(&self, _candidate: &Candidate, _ctx: &AgentContext) -> f64 {
        0.9
    }
}
