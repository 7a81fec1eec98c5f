//! Style configuration lookups.
//!
//! Plain values with documented defaults for any id or role that is absent.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::role::Role;

/// Weight used for operators without an explicit entry.
pub const DEFAULT_OPERATOR_WEIGHT: f64 = 1.0;

/// Density target used for roles without an explicit entry.
pub const DEFAULT_ROLE_DENSITY: f64 = 0.5;

/// Per-operator weights and per-role density targets and caps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    pub operator_weights: BTreeMap<String, f64>,
    pub role_densities: BTreeMap<Role, f64>,
    pub role_caps: BTreeMap<Role, usize>,
    pub disabled_operators: BTreeSet<String>,
}

impl StyleConfig {
    /// Weight multiplier for an operator (default 1.0).
    pub fn operator_weight(&self, operator_id: &str) -> f64 {
        self.operator_weights
            .get(operator_id)
            .copied()
            .unwrap_or(DEFAULT_OPERATOR_WEIGHT)
    }

    /// Density target for a role in [0, 1] (default 0.5).
    pub fn role_density(&self, role: &Role) -> f64 {
        self.role_densities
            .get(role)
            .copied()
            .unwrap_or(DEFAULT_ROLE_DENSITY)
    }

    /// Hard cap on hits per bar for a role; `None` means uncapped.
    pub fn role_cap(&self, role: &Role) -> Option<usize> {
        self.role_caps.get(role).copied()
    }

    pub fn is_operator_allowed(&self, operator_id: &str) -> bool {
        !self.disabled_operators.contains(operator_id)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (id, weight) in &self.operator_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EngineError::ScoreOutOfRange {
                    what: format!("weight of operator '{}'", id),
                    score: *weight,
                });
            }
        }
        for (role, density) in &self.role_densities {
            if !(0.0..=1.0).contains(density) {
                return Err(EngineError::ScoreOutOfRange {
                    what: format!("density of role '{}'", role),
                    score: *density,
                });
            }
        }
        Ok(())
    }
}
