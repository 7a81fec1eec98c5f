//! Bar-by-bar orchestration.
//!
//! For each bar the generator runs every allowed operator that applies,
//! rescales scores by style weight and repetition penalty, applies per-role
//! caps, runs the physicality filter and finally records the survivors into
//! memory. Bars are strictly sequential: a bar's scores depend on what the
//! bars before it recorded.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::candidate::{survival_order, time_order, Candidate};
use crate::context::{AgentContext, SectionType};
use crate::diagnostics::{DiagnosticLog, DiagnosticReason, FilterDiagnostic};
use crate::error::EngineError;
use crate::limb::LimbModel;
use crate::memory::{AgentMemory, FillShape};
use crate::operator::{default_operators, final_score, DrumOperator, Operator};
use crate::physicality::{PhysicalityFilter, PhysicalityRules};
use crate::plan::{kit_roles, SectionPlan};
use crate::role::Role;
use crate::sticking::{StickingLimits, StickingReport, StickingValidator};
use crate::style::StyleConfig;

#[cfg(test)]
mod tests;

/// What was played in one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarOutcome {
    pub bar: u32,
    pub section_type: SectionType,
    /// Surviving candidates in time order.
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "DiagnosticLog::is_empty")]
    pub diagnostics: DiagnosticLog,
}

/// Result of a full generation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub seed: u32,
    pub bars: Vec<BarOutcome>,
    /// Operators that fired in each section type, sorted.
    pub section_signatures: BTreeMap<SectionType, Vec<String>>,
}

impl Performance {
    /// Every performed event, bar by bar.
    pub fn events(&self) -> impl Iterator<Item = &Candidate> {
        self.bars.iter().flat_map(|b| b.candidates.iter())
    }

    pub fn event_count(&self) -> usize {
        self.bars.iter().map(|b| b.candidates.len()).sum()
    }

    /// Diagnostics of every bar, concatenated.
    pub fn diagnostics(&self) -> impl Iterator<Item = &FilterDiagnostic> {
        self.bars.iter().flat_map(|b| b.diagnostics.entries().iter())
    }
}

/// Runs operators, filter and memory for bars and passes.
#[derive(Debug, Clone)]
pub struct Generator {
    operators: Vec<DrumOperator>,
    filter: PhysicalityFilter,
    style: StyleConfig,
    sticking: StickingLimits,
    roles: Arc<BTreeSet<Role>>,
}

impl Generator {
    /// Creates a generator with the built-in operator set.
    pub fn new(
        model: LimbModel,
        rules: PhysicalityRules,
        style: StyleConfig,
    ) -> Result<Self, EngineError> {
        style.validate()?;
        let operators = default_operators(&style);
        Ok(Self {
            operators,
            roles: kit_roles(&model),
            filter: PhysicalityFilter::new(model, rules),
            style,
            sticking: StickingLimits::default(),
        })
    }

    /// Replaces the operator set.
    pub fn with_operators(mut self, operators: Vec<DrumOperator>) -> Self {
        self.operators = operators;
        self
    }

    pub fn with_sticking_limits(mut self, limits: StickingLimits) -> Self {
        self.sticking = limits;
        self
    }

    pub fn operators(&self) -> &[DrumOperator] {
        &self.operators
    }

    pub fn model(&self) -> &LimbModel {
        self.filter.model()
    }

    pub fn physicality(&self) -> &PhysicalityRules {
        self.filter.rules()
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn sticking_limits(&self) -> StickingLimits {
        self.sticking
    }

    /// Roles this generator's kit offers.
    pub fn kit_roles(&self) -> Arc<BTreeSet<Role>> {
        Arc::clone(&self.roles)
    }

    /// Collects candidates from every allowed, applicable operator.
    ///
    /// Scores are already combined with the style weight and the memory's
    /// repetition penalty.
    pub fn propose(
        &self,
        ctx: &AgentContext,
        memory: &AgentMemory,
    ) -> Result<Vec<Candidate>, EngineError> {
        let active: Vec<&DrumOperator> = self
            .operators
            .iter()
            .filter(|op| self.style.is_operator_allowed(op.id()) && op.can_apply(ctx))
            .collect();

        let batches = invoke(&active, ctx)?;

        let mut candidates = Vec::new();
        for (op, batch) in active.into_iter().zip(batches) {
            let weight = self.style.operator_weight(op.id());
            let penalty = memory.repetition_penalty(op.id());
            trace!(
                bar = ctx.bar,
                operator = op.id(),
                proposed = batch.len(),
                weight,
                penalty,
                "operator invoked"
            );
            for mut candidate in batch {
                candidate.score = final_score(candidate.score, weight, penalty);
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }

    /// Produces one bar and records it into `memory`.
    ///
    /// Survivors are returned in time order. When `diagnostics` is given it
    /// receives every role-cap and filter decision for the bar.
    pub fn generate_bar(
        &self,
        ctx: &AgentContext,
        memory: &mut AgentMemory,
        mut diagnostics: Option<&mut DiagnosticLog>,
    ) -> Result<Vec<Candidate>, EngineError> {
        ctx.validate()?;
        let ctx = with_recent_fill(ctx, memory);

        let proposed = self.propose(&ctx, memory)?;
        let capped = self.apply_role_caps(proposed, diagnostics.as_deref_mut());
        let mut survivors = self.filter.filter(&capped, diagnostics.as_deref_mut());

        remember(&ctx, &survivors, memory)?;
        survivors.sort_by(time_order);
        Ok(survivors)
    }

    /// Plays every bar of `plan` from a cleared memory.
    pub fn generate_pass(
        &self,
        plan: &SectionPlan,
        seed: u32,
        memory: &mut AgentMemory,
    ) -> Result<Performance, EngineError> {
        memory.clear();
        let contexts = plan.contexts(seed, self.kit_roles())?;

        let mut bars = Vec::with_capacity(contexts.len());
        for ctx in &contexts {
            let mut log = DiagnosticLog::new();
            let candidates = self.generate_bar(ctx, memory, Some(&mut log))?;
            bars.push(BarOutcome {
                bar: ctx.bar,
                section_type: ctx.section_type,
                candidates,
                diagnostics: log,
            });
        }

        let section_signatures = memory
            .section_signatures()
            .iter()
            .map(|(section, ops)| (*section, ops.iter().cloned().collect()))
            .collect();
        let performance = Performance {
            seed,
            bars,
            section_signatures,
        };
        info!(
            seed,
            bars = performance.bars.len(),
            events = performance.event_count(),
            "generation pass complete"
        );
        Ok(performance)
    }

    /// Sticking validator configured with this generator's limits.
    pub fn sticking_validator(&self) -> StickingValidator {
        StickingValidator::with_limits(self.sticking)
    }

    /// Runs the sticking rules over a whole performance. Advisory only.
    pub fn validate_performance(&self, performance: &Performance) -> StickingReport {
        let events: Vec<Candidate> = performance.events().cloned().collect();
        self.sticking_validator().validate(&events, self.model())
    }

    /// Enforces the style's per-role caps. Protected candidates are exempt.
    fn apply_role_caps(
        &self,
        candidates: Vec<Candidate>,
        mut diagnostics: Option<&mut DiagnosticLog>,
    ) -> Vec<Candidate> {
        if self.style.role_caps.is_empty() {
            return candidates;
        }
        let mut removed = vec![false; candidates.len()];

        for (role, &cap) in &self.style.role_caps {
            let members: Vec<usize> = (0..candidates.len())
                .filter(|&i| candidates[i].role == *role)
                .collect();
            let mut remaining = members.len();
            while remaining > cap {
                let weakest = members
                    .iter()
                    .copied()
                    .filter(|&i| !removed[i] && !candidates[i].protected)
                    .max_by(|&a, &b| survival_order(&candidates[a], &candidates[b]));
                let Some(index) = weakest else {
                    break;
                };
                removed[index] = true;
                remaining -= 1;
                debug!(
                    bar = candidates[index].bar,
                    role = %role,
                    cap,
                    candidate = %candidates[index].candidate_id,
                    "role cap removal"
                );
                if let Some(log) = diagnostics.as_deref_mut() {
                    log.record(FilterDiagnostic::removal(
                        &candidates[index],
                        self.model().required_limb(role),
                        DiagnosticReason::RoleCap { cap },
                    ));
                }
            }
        }

        candidates
            .into_iter()
            .zip(removed)
            .filter(|(_, gone)| !gone)
            .map(|(c, _)| c)
            .collect()
    }
}

#[cfg(feature = "parallel")]
fn invoke(
    operators: &[&DrumOperator],
    ctx: &AgentContext,
) -> Result<Vec<Vec<Candidate>>, EngineError> {
    use rayon::prelude::*;

    operators
        .par_iter()
        .map(|op| op.generate_candidates(ctx))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn invoke(
    operators: &[&DrumOperator],
    ctx: &AgentContext,
) -> Result<Vec<Vec<Candidate>>, EngineError> {
    operators
        .iter()
        .map(|op| op.generate_candidates(ctx))
        .collect()
}

/// Hands the last remembered fill to the operators unless the caller set one.
fn with_recent_fill<'a>(ctx: &'a AgentContext, memory: &AgentMemory) -> Cow<'a, AgentContext> {
    match (&ctx.recent_fill, memory.last_fill_shape()) {
        (None, Some(shape)) => {
            let mut owned = ctx.clone();
            owned.recent_fill = Some(shape.clone());
            Cow::Owned(owned)
        }
        _ => Cow::Borrowed(ctx),
    }
}

fn remember(
    ctx: &AgentContext,
    survivors: &[Candidate],
    memory: &mut AgentMemory,
) -> Result<(), EngineError> {
    for candidate in survivors {
        memory.record_decision(ctx.bar, &candidate.operator_id, &candidate.candidate_id)?;
    }

    let fired: BTreeSet<&str> = survivors.iter().map(|c| c.operator_id.as_str()).collect();
    for operator_id in fired {
        memory.record_section_signature(ctx.section_type, operator_id)?;
    }

    if let Some(shape) = fill_shape(ctx, survivors) {
        memory.record_fill_shape(shape)?;
    }
    Ok(())
}

/// Shape of the fill played in this bar, if any fill hit survived.
///
/// The tag names the operator with the most surviving fill hits; ties go to
/// the lower id.
pub fn fill_shape(ctx: &AgentContext, survivors: &[Candidate]) -> Option<FillShape> {
    let hits: Vec<&Candidate> = survivors.iter().filter(|c| c.fill_role.is_fill()).collect();
    if hits.is_empty() {
        return None;
    }

    let mut per_operator: BTreeMap<&str, usize> = BTreeMap::new();
    for hit in &hits {
        *per_operator.entry(hit.operator_id.as_str()).or_insert(0) += 1;
    }
    let tag = per_operator
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(id, _)| id.to_string());

    let slots = (ctx.beats_per_bar as f64 * 4.0).max(1.0);
    Some(FillShape {
        bar: ctx.bar,
        roles: hits.iter().map(|c| c.role.clone()).collect(),
        density: (hits.len() as f64 / slots).min(1.0),
        duration_bars: 1,
        tag,
    })
}
