//! Physicality filter.
//!
//! Given every candidate proposed for a bar, keeps the subset a drummer can
//! actually play and that fits the bar's density cap:
//!
//! 1. candidates whose role has no limb pass straight to the density step;
//! 2. limb conflicts are detected among the mapped candidates;
//! 3. each conflict group is resolved by [`StrictnessLevel`];
//! 4. the lowest-ranked unprotected candidates are dropped until the bar is
//!    at or under `max_hits_per_bar`.
//!
//! Protected candidates take part in conflict detection but are never
//! removed. Survivors keep their input order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::beat::Beat;
use crate::candidate::{survival_order, Candidate};
use crate::conflict::detect_conflicts;
use crate::diagnostics::{DiagnosticLog, DiagnosticReason, FilterDiagnostic};
use crate::limb::{Limb, LimbAssignment, LimbModel};


/// How aggressively limb conflicts are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrictnessLevel {
    /// Remove every unprotected member of a conflict group.
    Strict,
    /// Keep the single best member of a conflict group. A protected member
    /// always owns the limb, whatever the other members score.
    #[default]
    Normal,
    /// Keep everything, record the conflict.
    Loose,
}

/// Filter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicalityRules {
    pub strictness: StrictnessLevel,
    /// Cap on surviving candidates per bar. Protected candidates may exceed it.
    pub max_hits_per_bar: usize,
}

impl Default for PhysicalityRules {
    fn default() -> Self {
        Self {
            strictness: StrictnessLevel::Normal,
            max_hits_per_bar: 32,
        }
    }
}

impl PhysicalityRules {
    pub fn new(strictness: StrictnessLevel, max_hits_per_bar: usize) -> Self {
        Self {
            strictness,
            max_hits_per_bar,
        }
    }
}

/// Removes physically impossible and excess candidates from a bar.
#[derive(Debug, Clone)]
pub struct PhysicalityFilter {
    model: LimbModel,
    rules: PhysicalityRules,
}

impl PhysicalityFilter {
    pub fn new(model: LimbModel, rules: PhysicalityRules) -> Self {
        Self { model, rules }
    }

    pub fn model(&self) -> &LimbModel {
        &self.model
    }

    pub fn rules(&self) -> &PhysicalityRules {
        &self.rules
    }

    /// Filters one bar's candidates.
    ///
    /// When `diagnostics` is given, every removal and every unresolved
    /// conflict is appended to it.
    pub fn filter(
        &self,
        candidates: &[Candidate],
        mut diagnostics: Option<&mut DiagnosticLog>,
    ) -> Vec<Candidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut removed = vec![false; candidates.len()];
        let limbs: Vec<Option<Limb>> = candidates
            .iter()
            .map(|c| self.model.required_limb(&c.role))
            .collect();

        self.resolve_conflicts(candidates, &limbs, &mut removed, diagnostics.as_deref_mut());
        self.enforce_cap(candidates, &limbs, &mut removed, diagnostics.as_deref_mut());

        candidates
            .iter()
            .zip(&removed)
            .filter(|(_, gone)| !**gone)
            .map(|(c, _)| c.clone())
            .collect()
    }

    fn resolve_conflicts(
        &self,
        candidates: &[Candidate],
        limbs: &[Option<Limb>],
        removed: &mut [bool],
        mut diagnostics: Option<&mut DiagnosticLog>,
    ) {
        let mut members: BTreeMap<(u32, Beat, Limb), Vec<usize>> = BTreeMap::new();
        let mut assignments = Vec::new();
        for (index, (candidate, limb)) in candidates.iter().zip(limbs).enumerate() {
            let Some(limb) = limb else {
                continue;
            };
            members
                .entry((candidate.bar, candidate.beat, *limb))
                .or_default()
                .push(index);
            assignments.push(LimbAssignment::new(
                candidate.bar,
                candidate.beat,
                candidate.role.clone(),
                *limb,
            ));
        }

        for conflict in detect_conflicts(&assignments) {
            let Some(group) = members.get(&(conflict.bar, conflict.beat, conflict.limb)) else {
                continue;
            };

            match self.rules.strictness {
                StrictnessLevel::Strict => {
                    for &index in group {
                        if candidates[index].protected {
                            continue;
                        }
                        removed[index] = true;
                        debug!(
                            bar = conflict.bar,
                            beat = %conflict.beat,
                            limb = %conflict.limb,
                            candidate = %candidates[index].candidate_id,
                            "strict conflict removal"
                        );
                        if let Some(log) = diagnostics.as_deref_mut() {
                            log.record(FilterDiagnostic::removal(
                                &candidates[index],
                                Some(conflict.limb),
                                DiagnosticReason::StrictConflict,
                            ));
                        }
                    }
                }
                StrictnessLevel::Normal => {
                    let protected: Vec<usize> = group
                        .iter()
                        .copied()
                        .filter(|&i| candidates[i].protected)
                        .collect();
                    // A protected member already owns the limb; otherwise the best member does.
                    let survivor = match protected.first() {
                        Some(&index) => index,
                        None => match group
                            .iter()
                            .copied()
                            .min_by(|&a, &b| survival_order(&candidates[a], &candidates[b]))
                        {
                            Some(index) => index,
                            None => continue,
                        },
                    };
                    for &index in group {
                        if index == survivor || candidates[index].protected {
                            continue;
                        }
                        removed[index] = true;
                        debug!(
                            bar = conflict.bar,
                            beat = %conflict.beat,
                            limb = %conflict.limb,
                            candidate = %candidates[index].candidate_id,
                            survivor = %candidates[survivor].candidate_id,
                            "conflict member outscored"
                        );
                        if let Some(log) = diagnostics.as_deref_mut() {
                            log.record(FilterDiagnostic::removal(
                                &candidates[index],
                                Some(conflict.limb),
                                DiagnosticReason::Outscored {
                                    survivor: candidates[survivor].candidate_id.clone(),
                                },
                            ));
                        }
                    }
                }
                StrictnessLevel::Loose => {
                    debug!(
                        bar = conflict.bar,
                        beat = %conflict.beat,
                        limb = %conflict.limb,
                        count = conflict.conflict_count,
                        "conflict left unresolved"
                    );
                    if let Some(log) = diagnostics.as_deref_mut() {
                        log.record(FilterDiagnostic {
                            bar: conflict.bar,
                            beat: conflict.beat,
                            limb: Some(conflict.limb),
                            role: None,
                            operator_id: None,
                            candidate_id: None,
                            reason: DiagnosticReason::UnresolvedConflict {
                                roles: conflict.roles.iter().cloned().collect(),
                                count: conflict.conflict_count,
                            },
                        });
                    }
                }
            }
        }
    }

    fn enforce_cap(
        &self,
        candidates: &[Candidate],
        limbs: &[Option<Limb>],
        removed: &mut [bool],
        mut diagnostics: Option<&mut DiagnosticLog>,
    ) {
        let cap = self.rules.max_hits_per_bar;
        let mut surviving = removed.iter().filter(|gone| !**gone).count();

        while surviving > cap {
            let weakest = (0..candidates.len())
                .filter(|&i| !removed[i] && !candidates[i].protected)
                .max_by(|&a, &b| survival_order(&candidates[a], &candidates[b]));
            let Some(index) = weakest else {
                // Only protected candidates remain.
                break;
            };
            removed[index] = true;
            surviving -= 1;
            debug!(
                bar = candidates[index].bar,
                beat = %candidates[index].beat,
                candidate = %candidates[index].candidate_id,
                cap,
                "overcrowding removal"
            );
            if let Some(log) = diagnostics.as_deref_mut() {
                log.record(FilterDiagnostic::removal(
                    &candidates[index],
                    limbs[index],
                    DiagnosticReason::Overcrowded { cap },
                ));
            }
        }
    }
}
