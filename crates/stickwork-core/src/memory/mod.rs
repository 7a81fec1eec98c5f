//! Agent memory: bounded, decay-weighted history of operator decisions.
//!
//! Memory is the only state carried across bars. It is scoped to one
//! generation pass and must be cleared (or rebuilt) between passes. Every
//! aggregation walks `BTreeMap`s so results never depend on hashing order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::context::SectionType;
use crate::error::{require_bar, require_non_empty, EngineError};
use crate::role::Role;


/// How a decision's weight falls off with age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum DecayCurve {
    /// `(window - age) / window`
    Linear,
    /// `factor ^ age`, with `0 < factor < 1`
    Exponential { factor: f64 },
}

impl DecayCurve {
    /// Weight of one occurrence `age` bars ago.
    pub fn weight(&self, age: u32, window_size: u32) -> f64 {
        match self {
            DecayCurve::Linear => {
                window_size.saturating_sub(age) as f64 / window_size as f64
            }
            DecayCurve::Exponential { factor } => factor.powi(age as i32),
        }
    }
}

impl Default for DecayCurve {
    fn default() -> Self {
        DecayCurve::Exponential { factor: 0.7 }
    }
}

/// Memory configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    pub window_size: u32,
    pub decay: DecayCurve,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_size: 8,
            decay: DecayCurve::default(),
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.window_size == 0 {
            return Err(EngineError::InvalidWindowSize);
        }
        if let DecayCurve::Exponential { factor } = self.decay {
            if !(factor > 0.0 && factor < 1.0) {
                return Err(EngineError::InvalidDecayFactor { factor });
            }
        }
        Ok(())
    }
}

/// Shape of the most recent fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillShape {
    /// Bar the fill was played in.
    pub bar: u32,
    pub roles: BTreeSet<Role>,
    /// Hits per available sixteenth slot, in [0, 1].
    pub density: f64,
    pub duration_bars: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl FillShape {
    pub fn validate(&self) -> Result<(), EngineError> {
        require_bar(self.bar)?;
        if !(0.0..=1.0).contains(&self.density) {
            return Err(EngineError::ScoreOutOfRange {
                what: "fill density".to_string(),
                score: self.density,
            });
        }
        if self.duration_bars == 0 {
            return Err(EngineError::InvalidContext {
                bar: self.bar,
                message: "fill duration must be at least one bar".to_string(),
            });
        }
        Ok(())
    }

    /// True when `other` uses the same roles at a similar density.
    pub fn resembles(&self, roles: &BTreeSet<Role>, density: f64) -> bool {
        self.roles == *roles && (self.density - density).abs() < 0.15
    }
}

/// One recorded `(operator_id, candidate_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Decision {
    pub operator_id: String,
    pub candidate_id: String,
}

/// Sliding-window memory of operator decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMemory {
    config: MemoryConfig,
    decisions: BTreeMap<u32, Vec<Decision>>,
    current_bar: u32,
    last_fill: Option<FillShape>,
    signatures: BTreeMap<SectionType, BTreeSet<String>>,
}

impl AgentMemory {
    /// Creates an empty memory. The configuration is validated.
    pub fn new(config: MemoryConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            decisions: BTreeMap::new(),
            current_bar: 0,
            last_fill: None,
            signatures: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Most recently recorded bar; 0 before any recording.
    pub fn current_bar(&self) -> u32 {
        self.current_bar
    }

    /// Records that `operator_id` produced `candidate_id` on `bar`.
    pub fn record_decision(
        &mut self,
        bar: u32,
        operator_id: &str,
        candidate_id: &str,
    ) -> Result<(), EngineError> {
        require_bar(bar)?;
        require_non_empty(operator_id, "operator_id")?;
        require_non_empty(candidate_id, "candidate_id")?;

        // Prune against the bar as it stood before this decision.
        let oldest = self.oldest_bar_in_window();
        self.decisions.retain(|&b, _| b >= oldest);
        if bar < oldest {
            trace!(bar, oldest, operator_id, "decision recorded behind memory window");
        }

        self.decisions.entry(bar).or_default().push(Decision {
            operator_id: operator_id.to_string(),
            candidate_id: candidate_id.to_string(),
        });
        self.current_bar = self.current_bar.max(bar);
        Ok(())
    }

    /// Decisions recorded for `bar`, if still in the window.
    pub fn decisions_for(&self, bar: u32) -> &[Decision] {
        self.decisions.get(&bar).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Per-operator use counts over the trailing `last_n_bars`.
    pub fn recent_operator_usage(&self, last_n_bars: u32) -> BTreeMap<String, usize> {
        let mut usage = BTreeMap::new();
        if self.current_bar == 0 || last_n_bars == 0 {
            return usage;
        }
        let from = self.current_bar.saturating_sub(last_n_bars - 1).max(1);
        for decisions in self.decisions.range(from..=self.current_bar).map(|(_, d)| d) {
            for decision in decisions {
                *usage.entry(decision.operator_id.clone()).or_insert(0) += 1;
            }
        }
        usage
    }

    /// Decay-weighted repetition penalty for `operator_id`, in [0, 1].
    pub fn repetition_penalty(&self, operator_id: &str) -> f64 {
        if self.current_bar == 0 {
            return 0.0;
        }
        let window = self.config.window_size;
        let mut total = 0.0;
        for (&bar, decisions) in &self.decisions {
            let age = self.current_bar - bar;
            if age >= window {
                continue;
            }
            let uses = decisions
                .iter()
                .filter(|d| d.operator_id == operator_id)
                .count();
            if uses == 0 {
                continue;
            }
            total += self.config.decay.weight(age, window) * uses as f64;
        }
        (total / window as f64).clamp(0.0, 1.0)
    }

    /// Replaces the remembered fill shape.
    pub fn record_fill_shape(&mut self, shape: FillShape) -> Result<(), EngineError> {
        shape.validate()?;
        self.last_fill = Some(shape);
        Ok(())
    }

    pub fn last_fill_shape(&self) -> Option<&FillShape> {
        self.last_fill.as_ref()
    }

    /// Adds `operator_id` to the signature of `section`.
    pub fn record_section_signature(
        &mut self,
        section: SectionType,
        operator_id: &str,
    ) -> Result<(), EngineError> {
        require_non_empty(operator_id, "operator_id")?;
        self.signatures
            .entry(section)
            .or_default()
            .insert(operator_id.to_string());
        Ok(())
    }

    /// Operators that have characterized `section` so far, sorted.
    pub fn section_signature(&self, section: SectionType) -> Vec<String> {
        self.signatures
            .get(&section)
            .map(|ops| ops.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every recorded signature, sorted by section type.
    pub fn section_signatures(&self) -> &BTreeMap<SectionType, BTreeSet<String>> {
        &self.signatures
    }

    /// Resets all state, keeping the configuration.
    pub fn clear(&mut self) {
        self.decisions.clear();
        self.current_bar = 0;
        self.last_fill = None;
        self.signatures.clear();
    }

    fn oldest_bar_in_window(&self) -> u32 {
        (self.current_bar + 1).saturating_sub(self.config.window_size).max(1)
    }
}

impl Default for AgentMemory {
    fn default() -> Self {
        Self {
            config: MemoryConfig::default(),
            decisions: BTreeMap::new(),
            current_bar: 0,
            last_fill: None,
            signatures: BTreeMap::new(),
        }
    }
}
