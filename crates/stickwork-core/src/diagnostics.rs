//! Explainability records for candidate removals.

use serde::{Deserialize, Serialize};

use crate::beat::Beat;
use crate::candidate::Candidate;
use crate::limb::Limb;
use crate::role::Role;

/// Why a diagnostic entry was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticReason {
    /// Removed by strict conflict resolution.
    StrictConflict,
    /// Removed because another member of its conflict group won.
    Outscored { survivor: String },
    /// Conflict left in place by loose resolution.
    UnresolvedConflict { roles: Vec<Role>, count: usize },
    /// Removed to bring the bar under `max_hits_per_bar`.
    Overcrowded { cap: usize },
    /// Removed by a per-role hard cap from the style.
    RoleCap { cap: usize },
}

/// One explainability record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDiagnostic {
    pub bar: u32,
    pub beat: Beat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limb: Option<Limb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<String>,
    pub reason: DiagnosticReason,
}

impl FilterDiagnostic {
    /// A record describing the removal of `candidate`.
    pub fn removal(candidate: &Candidate, limb: Option<Limb>, reason: DiagnosticReason) -> Self {
        Self {
            bar: candidate.bar,
            beat: candidate.beat,
            limb,
            role: Some(candidate.role.clone()),
            operator_id: Some(candidate.operator_id.clone()),
            candidate_id: Some(candidate.candidate_id.clone()),
            reason,
        }
    }

    /// True when this entry documents a removed candidate.
    pub fn is_removal(&self) -> bool {
        !matches!(self.reason, DiagnosticReason::UnresolvedConflict { .. })
    }
}

/// Append-only diagnostic recorder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticLog {
    entries: Vec<FilterDiagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: FilterDiagnostic) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[FilterDiagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that removed a candidate.
    pub fn removals(&self) -> impl Iterator<Item = &FilterDiagnostic> {
        self.entries.iter().filter(|e| e.is_removal())
    }

    /// Entries for conflicts left unresolved in loose mode.
    pub fn unresolved(&self) -> impl Iterator<Item = &FilterDiagnostic> {
        self.entries.iter().filter(|e| !e.is_removal())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn into_entries(self) -> Vec<FilterDiagnostic> {
        self.entries
    }
}
