use crate::beat::Beat;
use crate::candidate::{Articulation, Candidate, OnsetStrength};
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::operator::{candidate_id, Operator, OperatorFamily};
use crate::rng::range_inclusive;
use crate::role::Role;

const VELOCITY_BAND: (u32, u32) = (100, 122);

/// A downbeat crash on the first bar of a new section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrashOnOne;

impl Operator for CrashOnOne {
    fn id(&self) -> &'static str {
        "phrase.crash_on_one"
    }

    fn family(&self) -> OperatorFamily {
        OperatorFamily::PhrasePunctuation
    }

    fn can_apply(&self, ctx: &AgentContext) -> bool {
        ctx.is_section_start() && ctx.has_role(&Role::CRASH)
    }

    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError> {
        let mut rng = ctx.rng_for(self.id(), 0);
        let velocity = range_inclusive(&mut rng, VELOCITY_BAND.0, VELOCITY_BAND.1);
        let mut candidate = Candidate::new(
            self.id(),
            candidate_id(self.id(), ctx.bar, 0),
            ctx.bar,
            Beat::ONE,
            Role::CRASH,
            OnsetStrength::Downbeat,
            0.0,
        )?
        .with_velocity(velocity as u8)
        .with_articulation(Articulation::Accent);
        candidate.score = self.score(&candidate, ctx);
        Ok(vec![candidate])
    }

    fn score(&self, _candidate: &Candidate, ctx: &AgentContext) -> f64 {
        (0.6 + 0.4 * ctx.energy).clamp(0.0, 1.0)
    }
}
