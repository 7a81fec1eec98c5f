//! Limb conflict detection.
//!
//! A conflict is two or more assignments that need the same limb at exactly
//! the same `(bar, beat)`. Reports are ordered by `(bar, beat, limb)` and do
//! not depend on input order.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::beat::Beat;
use crate::candidate::Candidate;
use crate::limb::{Limb, LimbAssignment, LimbModel};
use crate::role::Role;

/// A group of assignments competing for one limb at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimbConflict {
    pub bar: u32,
    pub beat: Beat,
    pub limb: Limb,
    /// Number of assignments in the group (>= 2).
    pub conflict_count: usize,
    /// Distinct roles involved, sorted.
    pub roles: BTreeSet<Role>,
}

type GroupKey = (u32, Beat, Limb);

/// Groups assignments by `(bar, beat, limb)` and reports every group of two or more.
pub fn detect_conflicts(assignments: &[LimbAssignment]) -> Vec<LimbConflict> {
    let mut groups: BTreeMap<GroupKey, (usize, BTreeSet<Role>)> = BTreeMap::new();
    for assignment in assignments {
        let entry = groups
            .entry((assignment.bar, assignment.beat, assignment.limb))
            .or_default();
        entry.0 += 1;
        entry.1.insert(assignment.role.clone());
    }

    groups
        .into_iter()
        .filter(|(_, (count, _))| *count >= 2)
        .map(|((bar, beat, limb), (conflict_count, roles))| LimbConflict {
            bar,
            beat,
            limb,
            conflict_count,
            roles,
        })
        .collect()
}

/// Projects candidates through `model` and detects conflicts among them.
///
/// Candidates whose role has no mapped limb are dropped silently.
pub fn detect_candidate_conflicts(
    candidates: &[Candidate],
    model: &LimbModel,
) -> Vec<LimbConflict> {
    let assignments: Vec<LimbAssignment> = candidates
        .iter()
        .filter_map(|candidate| model.assign(candidate))
        .collect();
    detect_conflicts(&assignments)
}

/// Returns true as soon as any two assignments conflict.
pub fn has_conflicts(assignments: &[LimbAssignment]) -> bool {
    let mut seen: HashSet<GroupKey> = HashSet::with_capacity(assignments.len());
    assignments
        .iter()
        .any(|a| !seen.insert((a.bar, a.beat, a.limb)))
}

/// Candidate form of [`has_conflicts`].
pub fn has_candidate_conflicts(candidates: &[Candidate], model: &LimbModel) -> bool {
    let mut seen: HashSet<GroupKey> = HashSet::with_capacity(candidates.len());
    candidates
        .iter()
        .filter_map(|candidate| model.assign(candidate))
        .any(|a| !seen.insert((a.bar, a.beat, a.limb)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::OnsetStrength;
    use pretty_assertions::assert_eq;

    fn assignment(beat: f64, role: Role, limb: Limb) -> LimbAssignment {
        LimbAssignment::new(1, Beat::from_f64(beat).unwrap(), role, limb)
    }

    fn two_conflict_fixture() -> Vec<LimbAssignment> {
        vec![
            assignment(2.0, Role::SNARE, Limb::LeftHand),
            assignment(2.0, Role::TOM_HIGH, Limb::LeftHand),
            assignment(4.0, Role::SNARE, Limb::LeftHand),
            assignment(4.0, Role::FLOOR_TOM, Limb::LeftHand),
        ]
    }

    #[test]
    fn reports_two_conflicts_in_beat_order() {
        let conflicts = detect_conflicts(&two_conflict_fixture());
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].beat, Beat::whole(2));
        assert_eq!(conflicts[1].beat, Beat::whole(4));
        assert!(conflicts.iter().all(|c| c.conflict_count == 2));
        assert_eq!(
            conflicts[0].roles,
            BTreeSet::from([Role::SNARE, Role::TOM_HIGH])
        );
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = two_conflict_fixture();
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(1);
        let expected = detect_conflicts(&forward);
        assert_eq!(detect_conflicts(&reversed), expected);
        assert_eq!(detect_conflicts(&rotated), expected);
    }

    #[test]
    fn different_limbs_never_conflict() {
        let assignments = vec![
            assignment(1.0, Role::CLOSED_HAT, Limb::RightHand),
            assignment(1.0, Role::SNARE, Limb::LeftHand),
            assignment(1.0, Role::KICK, Limb::RightFoot),
        ];
        assert!(detect_conflicts(&assignments).is_empty());
        assert!(!has_conflicts(&assignments));
    }

    #[test]
    fn nearly_equal_beats_are_distinct_positions() {
        let assignments = vec![
            LimbAssignment::new(1, Beat::from_ticks(960), Role::SNARE, Limb::LeftHand),
            LimbAssignment::new(1, Beat::from_ticks(961), Role::TOM_MID, Limb::LeftHand),
        ];
        assert!(!has_conflicts(&assignments));
    }

    #[test]
    fn same_role_twice_counts_members() {
        let assignments = vec![
            assignment(3.0, Role::SNARE, Limb::LeftHand),
            assignment(3.0, Role::SNARE, Limb::LeftHand),
            assignment(3.0, Role::TOM_MID, Limb::LeftHand),
        ];
        let conflicts = detect_conflicts(&assignments);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].conflict_count, 3);
        assert_eq!(conflicts[0].roles.len(), 2);
    }

    #[test]
    fn candidate_overload_skips_unmapped_roles() {
        let model = LimbModel::right_handed();
        let shaker = Role::new("shaker").unwrap();
        let beat = Beat::whole(2);
        let candidates = vec![
            Candidate::new("a", "1", 1, beat, shaker.clone(), OnsetStrength::Offbeat, 0.5).unwrap(),
            Candidate::new("b", "1", 1, beat, shaker, OnsetStrength::Offbeat, 0.5).unwrap(),
            Candidate::new("c", "1", 1, beat, Role::SNARE, OnsetStrength::Backbeat, 0.5).unwrap(),
        ];
        assert!(detect_candidate_conflicts(&candidates, &model).is_empty());
        assert!(!has_candidate_conflicts(&candidates, &model));
    }

    #[test]
    fn empty_input_has_no_conflicts() {
        assert!(detect_conflicts(&[]).is_empty());
        assert!(!has_conflicts(&[]));
    }
}
