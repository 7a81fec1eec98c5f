use rand::Rng;

use crate::beat::Beat;
use crate::candidate::{Articulation, Candidate, OnsetStrength};
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::operator::{candidate_id, Operator, OperatorFamily};
use crate::role::Role;

/// Sparse accents only: kick on one, maybe snare on three.
///
/// Emits no cymbal candidates at all. The dropout comes from that omission;
/// nothing downstream treats this operator specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTime;

pub(crate) const STOP_TIME_TAG: &str = "stop_time";

impl Operator for StopTime {
    fn id(&self) -> &'static str {
        "phrase.stop_time"
    }

    fn family(&self) -> OperatorFamily {
        OperatorFamily::PhrasePunctuation
    }

    fn can_apply(&self, ctx: &AgentContext) -> bool {
        ctx.is_fill_window && ctx.beats_per_bar >= 3 && ctx.has_role(&Role::KICK)
    }

    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError> {
        let mut candidates = Vec::with_capacity(2);

        let mut kick = Candidate::new(
            self.id(),
            candidate_id(self.id(), ctx.bar, 0),
            ctx.bar,
            Beat::ONE,
            Role::KICK,
            OnsetStrength::Downbeat,
            0.0,
        )?
        .with_velocity(115)
        .with_articulation(Articulation::Accent)
        .with_tag(STOP_TIME_TAG);
        kick.score = self.score(&kick, ctx);
        candidates.push(kick);

        let mut rng = ctx.rng_for(self.id(), 0);
        let snare_chance = (0.5 + 0.3 * ctx.tension).clamp(0.0, 1.0);
        if ctx.has_role(&Role::SNARE) && rng.gen_bool(snare_chance) {
            let mut snare = Candidate::new(
                self.id(),
                candidate_id(self.id(), ctx.bar, 1),
                ctx.bar,
                Beat::whole(3),
                Role::SNARE,
                OnsetStrength::Strong,
                0.0,
            )?
            .with_velocity(110)
            .with_articulation(Articulation::Accent)
            .with_tag(STOP_TIME_TAG);
            snare.score = self.score(&snare, ctx);
            candidates.push(snare);
        }

        Ok(candidates)
    }

    fn score(&self, candidate: &Candidate, ctx: &AgentContext) -> f64 {
        let mut score = 0.5 + 0.3 * ctx.tension + 0.1 * (1.0 - ctx.busyness);
        if candidate.role == Role::SNARE {
            score -= 0.05;
        }
        score.clamp(0.0, 1.0)
    }
}
