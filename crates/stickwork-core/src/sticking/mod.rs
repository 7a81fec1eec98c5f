//! Sticking validator.
//!
//! A read-only quality pass over finished bars. Rules report violations and
//! never modify the pattern.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::beat::Beat;
use crate::candidate::Candidate;
use crate::error::EngineError;
use crate::limb::LimbModel;
use crate::role::Role;

mod rules;


pub use rules::{MaxConsecutiveLimbRule, MaxGhostNotesRule};

/// Ergonomic limits for the built-in rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StickingLimits {
    pub max_ghost_notes_per_bar: usize,
    pub max_consecutive_same_limb: usize,
}

impl Default for StickingLimits {
    fn default() -> Self {
        Self {
            max_ghost_notes_per_bar: 4,
            max_consecutive_same_limb: 5,
        }
    }
}

/// Where a violation happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickingLocation {
    pub bar: u32,
    pub beat: Beat,
    pub role: Role,
}

impl From<&Candidate> for StickingLocation {
    fn from(candidate: &Candidate) -> Self {
        Self {
            bar: candidate.bar,
            beat: candidate.beat,
            role: candidate.role.clone(),
        }
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickingViolation {
    pub rule_id: String,
    pub description: String,
    pub locations: Vec<StickingLocation>,
}

/// A sticking rule.
pub trait StickingRule: Send + Sync {
    /// Unique identifier (e.g. "sticking/max-ghost-notes").
    fn id(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Checks a bar or multi-bar span.
    fn check(&self, candidates: &[Candidate], model: &LimbModel) -> Vec<StickingViolation>;
}

/// Result of running every enabled rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickingReport {
    /// True if no violations were found.
    pub ok: bool,
    pub violations: Vec<StickingViolation>,
}

impl StickingReport {
    pub fn from_violations(violations: Vec<StickingViolation>) -> Self {
        Self {
            ok: violations.is_empty(),
            violations,
        }
    }

    /// Merges another report into this one.
    pub fn extend(&mut self, other: StickingReport) {
        self.violations.extend(other.violations);
        self.ok = self.violations.is_empty();
    }
}

/// Registry of sticking rules.
pub struct StickingValidator {
    rules: Vec<Box<dyn StickingRule>>,
    disabled: BTreeSet<String>,
}

impl StickingValidator {
    /// Creates an empty validator.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            disabled: BTreeSet::new(),
        }
    }

    /// Creates a validator with both built-in rules.
    pub fn with_limits(limits: StickingLimits) -> Self {
        let mut validator = Self::new();
        validator.register(Box::new(MaxGhostNotesRule::new(limits.max_ghost_notes_per_bar)));
        validator.register(Box::new(MaxConsecutiveLimbRule::new(
            limits.max_consecutive_same_limb,
        )));
        validator
    }

    pub fn register(&mut self, rule: Box<dyn StickingRule>) {
        self.rules.push(rule);
    }

    /// Disables a rule by id. Unknown ids are rejected.
    pub fn disable_rule(&mut self, rule_id: &str) -> Result<(), EngineError> {
        self.require_known(rule_id)?;
        self.disabled.insert(rule_id.to_string());
        Ok(())
    }

    /// Re-enables a previously disabled rule.
    pub fn enable_rule(&mut self, rule_id: &str) -> Result<(), EngineError> {
        self.require_known(rule_id)?;
        self.disabled.remove(rule_id);
        Ok(())
    }

    /// Ids of all registered rules, in registration order.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn is_enabled(&self, rule_id: &str) -> bool {
        !self.disabled.contains(rule_id)
    }

    /// Runs every enabled rule against `candidates`.
    pub fn validate(&self, candidates: &[Candidate], model: &LimbModel) -> StickingReport {
        let violations = self
            .rules
            .iter()
            .filter(|rule| self.is_enabled(rule.id()))
            .flat_map(|rule| rule.check(candidates, model))
            .collect();
        StickingReport::from_violations(violations)
    }

    fn require_known(&self, rule_id: &str) -> Result<(), EngineError> {
        if self.rules.iter().any(|r| r.id() == rule_id) {
            Ok(())
        } else {
            Err(EngineError::UnknownStickingRule {
                rule_id: rule_id.to_string(),
            })
        }
    }
}

impl Default for StickingValidator {
    fn default() -> Self {
        Self::with_limits(StickingLimits::default())
    }
}
