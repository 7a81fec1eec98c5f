//! Operator contract.
//!
//! An operator inspects a read-only [`AgentContext`], decides whether it
//! applies, and proposes candidates with a self-assigned score. Operators
//! hold no state across bars and never see each other.
//!
//! Operator ids are persisted in memory and used as the conflict tie-break,
//! so changing one is a compatibility break.

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::context::AgentContext;
use crate::error::EngineError;
use crate::style::StyleConfig;

/// Grouping used for weighting and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorFamily {
    /// Fills, crashes, setup hits and stop-time near section boundaries.
    PhrasePunctuation,
    /// Steady time: backbeat, kick pulse, cymbal ostinato, ghost notes.
    Timekeeping,
}

/// A rule object that proposes candidate events for a bar.
pub trait Operator: Send + Sync {
    /// Stable identifier (e.g. "phrase.crash_on_one").
    fn id(&self) -> &'static str;

    fn family(&self) -> OperatorFamily;

    /// Cheap, RNG-free gate evaluated before generation.
    fn can_apply(&self, ctx: &AgentContext) -> bool;

    /// Proposes candidates. Deterministic for a given context; may be empty.
    fn generate_candidates(&self, ctx: &AgentContext) -> Result<Vec<Candidate>, EngineError>;

    /// Context-sensitive desirability in [0, 1].
    fn score(&self, candidate: &Candidate, ctx: &AgentContext) -> f64;
}

/// `score × weight × (1 − penalty)`, clamped to [0, 1].
pub fn final_score(score: f64, style_weight: f64, memory_penalty: f64) -> f64 {
    (score * style_weight * (1.0 - memory_penalty)).clamp(0.0, 1.0)
}

/// Builds the candidate id for hit `index` of an operator in a bar.
pub(crate) fn candidate_id(operator_id: &str, bar: u32, index: usize) -> String {
    format!("{}:{}:{}", operator_id, bar, index)
}

/// Linear interpolation between two velocities.
pub(crate) fn lerp_velocity(from: u32, to: u32, t: f64) -> u8 {
    let v = from as f64 + (to as f64 - from as f64) * t.clamp(0.0, 1.0);
    v.round().clamp(1.0, 127.0) as u8
}

/// Implements [`Operator`] for an enum whose variants each wrap an operator.
macro_rules! delegate_operator {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::operator::Operator for $name {
            fn id(&self) -> &'static str {
                match self {
                    $($name::$variant(op) => $crate::operator::Operator::id(op),)+
                }
            }

            fn family(&self) -> $crate::operator::OperatorFamily {
                match self {
                    $($name::$variant(op) => $crate::operator::Operator::family(op),)+
                }
            }

            fn can_apply(&self, ctx: &$crate::context::AgentContext) -> bool {
                match self {
                    $($name::$variant(op) => $crate::operator::Operator::can_apply(op, ctx),)+
                }
            }

            fn generate_candidates(
                &self,
                ctx: &$crate::context::AgentContext,
            ) -> Result<Vec<$crate::candidate::Candidate>, $crate::error::EngineError> {
                match self {
                    $($name::$variant(op) => {
                        $crate::operator::Operator::generate_candidates(op, ctx)
                    })+
                }
            }

            fn score(
                &self,
                candidate: &$crate::candidate::Candidate,
                ctx: &$crate::context::AgentContext,
            ) -> f64 {
                match self {
                    $($name::$variant(op) => {
                        $crate::operator::Operator::score(op, candidate, ctx)
                    })+
                }
            }
        }
    };
}

pub mod groove;
pub mod phrase;

pub use groove::GrooveOperator;
pub use phrase::PhraseOperator;

/// Every operator kind, grouped by family.
#[derive(Debug, Clone, PartialEq)]
pub enum DrumOperator {
    Phrase(PhraseOperator),
    Groove(GrooveOperator),
}

delegate_operator!(DrumOperator { Phrase, Groove });

/// The full built-in operator set, configured from the style.
pub fn default_operators(style: &StyleConfig) -> Vec<DrumOperator> {
    let mut operators: Vec<DrumOperator> = groove::all_operators(style)
        .into_iter()
        .map(DrumOperator::Groove)
        .collect();
    operators.extend(phrase::all_operators().into_iter().map(DrumOperator::Phrase));
    operators
}
