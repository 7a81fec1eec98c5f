use rand::Rng;

use crate::beat::Beat;
use crate::candidate::{Candidate, FillRole, OnsetStrength};
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::operator::{candidate_id, Operator, OperatorFamily};
use crate::role::Role;

/// Probability that the kick is doubled by a snare.
const COMPANION_SNARE_CHANCE: f64 = 0.75;

/// Kick (and usually snare) on the "and" of the last beat, leading into the next bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupHit;

impl SetupHit {
    fn position(ctx: &AgentContext) -> Beat {
        Beat::whole(ctx.beats_per_bar).plus_sixteenths(2)
    }
}

impl Operator for SetupHit {
    fn id(&self) -> &'static str {
        "phrase.setup_hit"
    }

    fn family(&self) -> OperatorFamily {
        OperatorFamily::PhrasePunctuation
    }

    fn can_apply(&self, ctx: &AgentContext) -> bool {
        (ctx.is_section_end() || ctx.is_fill_window)
            && ctx.beats_per_bar >= 4
            && ctx.has_role(&Role::KICK)
    }

    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError> {
        let beat = Self::position(ctx);
        let mut candidates = Vec::with_capacity(2);

        let mut kick = Candidate::new(
            self.id(),
            candidate_id(self.id(), ctx.bar, 0),
            ctx.bar,
            beat,
            Role::KICK,
            OnsetStrength::Pickup,
            0.0,
        )?
        .with_velocity(108)
        .with_fill_role(FillRole::Setup);
        kick.score = self.score(&kick, ctx);
        candidates.push(kick);

        let mut rng = ctx.rng_for(self.id(), 0);
        if ctx.has_role(&Role::SNARE) && rng.gen_bool(COMPANION_SNARE_CHANCE) {
            let mut snare = Candidate::new(
                self.id(),
                candidate_id(self.id(), ctx.bar, 1),
                ctx.bar,
                beat,
                Role::SNARE,
                OnsetStrength::Pickup,
                0.0,
            )?
            .with_velocity(100)
            .with_fill_role(FillRole::Setup);
            snare.score = self.score(&snare, ctx);
            candidates.push(snare);
        }

        Ok(candidates)
    }

    fn score(&self, candidate: &Candidate, ctx: &AgentContext) -> f64 {
        let mut score = 0.6 + 0.2 * ctx.tension;
        if ctx.is_section_end() {
            score += 0.1;
        }
        if candidate.role != Role::KICK {
            score -= 0.1;
        }
        score.clamp(0.0, 1.0)
    }
}
