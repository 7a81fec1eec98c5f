//! Phrase punctuation operators.
//!
//! These fire near section boundaries or inside a fill window. Fill windows
//! and boundaries are facts of the context; none of these operators keep
//! state of their own.

use crate::beat::Beat;
use crate::candidate::FillRole;

mod crash_on_one;
mod setup_hit;
mod stop_time;
mod tom_fill;
mod turnaround;


pub use crash_on_one::CrashOnOne;
pub use setup_hit::SetupHit;
pub use stop_time::StopTime;
pub use tom_fill::{FillDirection, TomFill};
pub use turnaround::{TurnaroundFill, TurnaroundSpan};

/// Closed set of phrase punctuation operators.
#[derive(Debug, Clone, PartialEq)]
pub enum PhraseOperator {
    TomFill(TomFill),
    CrashOnOne(CrashOnOne),
    SetupHit(SetupHit),
    StopTime(StopTime),
    Turnaround(TurnaroundFill),
}

delegate_operator!(PhraseOperator {
    TomFill,
    CrashOnOne,
    SetupHit,
    StopTime,
    Turnaround,
});

/// Every phrase punctuation operator.
pub fn all_operators() -> Vec<PhraseOperator> {
    vec![
        PhraseOperator::CrashOnOne(CrashOnOne),
        PhraseOperator::SetupHit(SetupHit),
        PhraseOperator::StopTime(StopTime),
        PhraseOperator::TomFill(TomFill::ascending()),
        PhraseOperator::TomFill(TomFill::descending()),
        PhraseOperator::Turnaround(TurnaroundFill::short()),
        PhraseOperator::Turnaround(TurnaroundFill::full()),
    ]
}

/// Fill role for hit `index` of `count`.
pub(crate) fn fill_role_at(index: usize, count: usize) -> FillRole {
    if index == 0 {
        FillRole::FillStart
    } else if index + 1 == count {
        FillRole::FillEnd
    } else {
        FillRole::FillBody
    }
}

/// Sixteenth-note grid points from `start` (inclusive) for `beats` beats.
pub(crate) fn sixteenth_grid(start: Beat, beats: u32) -> Vec<Beat> {
    (0..(beats as i64 * 4))
        .map(|i| start.plus_sixteenths(i))
        .collect()
}

/// Score multiplier applied when the last fill came from the same operator.
pub(crate) const REPEATED_FILL_FACTOR: f64 = 0.7;
