use serde::{Deserialize, Serialize};

use crate::beat::Beat;
use crate::candidate::{Articulation, Candidate, OnsetStrength};
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::operator::{candidate_id, Operator, OperatorFamily};
use crate::role::Role;

/// Energy at which the cymbal moves from the closed hat to the ride.
pub const RIDE_ENERGY: f64 = 0.7;

/// Cymbal ostinato grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subdivision {
    Quarter,
    Eighth,
    Sixteenth,
}

impl Subdivision {
    /// Maps a role density target onto a grid.
    pub fn from_density(density: f64) -> Self {
        if density < 0.34 {
            Subdivision::Quarter
        } else if density < 0.67 {
            Subdivision::Eighth
        } else {
            Subdivision::Sixteenth
        }
    }

    /// Sixteenths between consecutive hits.
    pub fn step(&self) -> i64 {
        match self {
            Subdivision::Quarter => 4,
            Subdivision::Eighth => 2,
            Subdivision::Sixteenth => 1,
        }
    }
}

/// Steady hats or ride across the whole bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Timekeeper {
    subdivision: Subdivision,
}

impl Timekeeper {
    pub fn new(subdivision: Subdivision) -> Self {
        Self { subdivision }
    }

    pub fn subdivision(&self) -> Subdivision {
        self.subdivision
    }

    /// Ride at high energy when the kit has one, otherwise the closed hat.
    pub fn cymbal(ctx: &AgentContext) -> Option<Role> {
        let prefer_ride = ctx.energy >= RIDE_ENERGY;
        let order = if prefer_ride {
            [Role::RIDE, Role::CLOSED_HAT]
        } else {
            [Role::CLOSED_HAT, Role::RIDE]
        };
        order.into_iter().find(|role| ctx.has_role(role))
    }
}

impl Operator for Timekeeper {
    fn id(&self) -> &'static str {
        "groove.timekeeper"
    }

    fn family(&self) -> OperatorFamily {
        OperatorFamily::Timekeeping
    }

    fn can_apply(&self, ctx: &AgentContext) -> bool {
        Self::cymbal(ctx).is_some()
    }

    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError> {
        let Some(role) = Self::cymbal(ctx) else {
            return Ok(Vec::new());
        };
        let step = self.subdivision.step();
        let hits = ctx.beats_per_bar as i64 * 4 / step;

        let mut candidates = Vec::with_capacity(hits as usize);
        for i in 0..hits {
            let beat = Beat::ONE.plus_sixteenths(i * step);
            let (strength, velocity) = if beat.is_on_beat() {
                (OnsetStrength::Strong, 88)
            } else {
                (OnsetStrength::Offbeat, 70)
            };
            let mut candidate = Candidate::new(
                self.id(),
                candidate_id(self.id(), ctx.bar, i as usize),
                ctx.bar,
                beat,
                role.clone(),
                strength,
                0.0,
            )?
            .with_velocity(velocity);
            if role == Role::CLOSED_HAT {
                candidate = candidate.with_articulation(Articulation::Closed);
            }
            candidate.score = self.score(&candidate, ctx);
            candidates.push(candidate);
        }
        Ok(candidates)
    }

    fn score(&self, candidate: &Candidate, ctx: &AgentContext) -> f64 {
        if ctx.is_section_start() && candidate.beat == Beat::ONE {
            // The downbeat belongs to the crash when there is one.
            0.4
        } else if ctx.is_fill_window {
            0.35
        } else {
            0.65
        }
    }
}
