//! Timekeeping operators.
//!
//! The steady layer underneath the phrase punctuation: backbeat, kick pulse,
//! a cymbal ostinato and seeded ghost notes. Style densities are read once,
//! when the operators are built.

use crate::role::Role;
use crate::style::StyleConfig;

mod backbeat;
mod ghost_notes;
mod pulse_kick;
mod timekeeper;


pub use backbeat::Backbeat;
pub use ghost_notes::GhostNotes;
pub use pulse_kick::PulseKick;
pub use timekeeper::{Subdivision, Timekeeper};

/// Closed set of timekeeping operators.
#[derive(Debug, Clone, PartialEq)]
pub enum GrooveOperator {
    Backbeat(Backbeat),
    PulseKick(PulseKick),
    Timekeeper(Timekeeper),
    GhostNotes(GhostNotes),
}

delegate_operator!(GrooveOperator {
    Backbeat,
    PulseKick,
    Timekeeper,
    GhostNotes,
});

/// Every timekeeping operator, configured from the style.
pub fn all_operators(style: &StyleConfig) -> Vec<GrooveOperator> {
    vec![
        GrooveOperator::Backbeat(Backbeat),
        GrooveOperator::PulseKick(PulseKick),
        GrooveOperator::Timekeeper(Timekeeper::new(Subdivision::from_density(
            style.role_density(&Role::CLOSED_HAT),
        ))),
        GrooveOperator::GhostNotes(GhostNotes::new(style.role_density(&Role::SNARE))),
    ]
}
