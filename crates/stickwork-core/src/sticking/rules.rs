//! Built-in sticking rules.

use std::collections::BTreeMap;

use crate::candidate::{time_order, Candidate};
use crate::limb::{Limb, LimbModel};

use super::{StickingLocation, StickingRule, StickingViolation};

/// Rule: sticking/max-ghost-notes
/// Flags bars with more ghost notes than the limit.
pub struct MaxGhostNotesRule {
    max_per_bar: usize,
}

impl MaxGhostNotesRule {
    pub fn new(max_per_bar: usize) -> Self {
        Self { max_per_bar }
    }
}

impl StickingRule for MaxGhostNotesRule {
    fn id(&self) -> &'static str {
        "sticking/max-ghost-notes"
    }

    fn description(&self) -> &'static str {
        "Too many ghost notes in one bar"
    }

    fn check(&self, candidates: &[Candidate], _model: &LimbModel) -> Vec<StickingViolation> {
        let mut by_bar: BTreeMap<u32, Vec<&Candidate>> = BTreeMap::new();
        for candidate in candidates.iter().filter(|c| c.is_ghost()) {
            by_bar.entry(candidate.bar).or_default().push(candidate);
        }

        by_bar
            .into_iter()
            .filter(|(_, ghosts)| ghosts.len() > self.max_per_bar)
            .map(|(bar, mut ghosts)| {
                ghosts.sort_by(|a, b| time_order(a, b));
                StickingViolation {
                    rule_id: self.id().to_string(),
                    description: format!(
                        "bar {} has {} ghost notes (max {})",
                        bar,
                        ghosts.len(),
                        self.max_per_bar
                    ),
                    locations: ghosts.into_iter().map(StickingLocation::from).collect(),
                }
            })
            .collect()
    }
}

/// Rule: sticking/max-consecutive-limb
/// Flags runs of consecutive hits on one limb longer than the limit.
pub struct MaxConsecutiveLimbRule {
    max_run: usize,
}

impl MaxConsecutiveLimbRule {
    pub fn new(max_run: usize) -> Self {
        Self { max_run }
    }

    fn violation(&self, limb: Limb, run: &[&Candidate]) -> StickingViolation {
        let first = run[0];
        StickingViolation {
            rule_id: self.id().to_string(),
            description: format!(
                "{} consecutive {} hits from bar {} beat {} (max {})",
                run.len(),
                limb,
                first.bar,
                first.beat,
                self.max_run
            ),
            locations: run.iter().copied().map(StickingLocation::from).collect(),
        }
    }
}

impl StickingRule for MaxConsecutiveLimbRule {
    fn id(&self) -> &'static str {
        "sticking/max-consecutive-limb"
    }

    fn description(&self) -> &'static str {
        "Too many consecutive hits on the same limb"
    }

    fn check(&self, candidates: &[Candidate], model: &LimbModel) -> Vec<StickingViolation> {
        let mut ordered: Vec<(&Candidate, Limb)> = candidates
            .iter()
            .filter_map(|c| model.required_limb(&c.role).map(|limb| (c, limb)))
            .collect();
        ordered.sort_by(|a, b| time_order(a.0, b.0));

        let mut violations = Vec::new();
        let mut run: Vec<&Candidate> = Vec::new();
        let mut run_limb: Option<Limb> = None;

        for (candidate, limb) in ordered {
            if run_limb != Some(limb) {
                if let Some(prev) = run_limb {
                    if run.len() > self.max_run {
                        violations.push(self.violation(prev, &run));
                    }
                }
                run.clear();
                run_limb = Some(limb);
            }
            run.push(candidate);
        }
        if let Some(limb) = run_limb {
            if run.len() > self.max_run {
                violations.push(self.violation(limb, &run));
            }
        }

        violations
    }
}
