//! Error types for the generation core.
//!
//! Only contract violations are errors. Data-shape anomalies (an unmapped
//! role, an empty candidate set, a bar too short for an operator's pattern)
//! are handled as no-ops by the components themselves.

use thiserror::Error;

/// Contract violations raised by the generation core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("bar number must be >= 1 (got {bar})")]
    InvalidBarNumber { bar: u32 },
    #[error("score {score} for {what} is outside [0, 1]")]
    ScoreOutOfRange { what: String, score: f64 },
    #[error("{field} must not be empty")]
    EmptyIdentifier { field: &'static str },
    #[error("memory window size must be > 0")]
    InvalidWindowSize,
    #[error("exponential decay factor must be in (0, 1) (got {factor})")]
    InvalidDecayFactor { factor: f64 },
    #[error("unknown limb preset '{name}'")]
    UnknownLimbPreset { name: String },
    #[error("unknown limb '{name}'")]
    UnknownLimb { name: String },
    #[error("unknown sticking rule '{rule_id}'")]
    UnknownStickingRule { rule_id: String },
    #[error("invalid beat position: {message}")]
    InvalidBeat { message: String },
    #[error("invalid section plan at section {index}: {message}")]
    InvalidSectionPlan { index: usize, message: String },
    #[error("invalid context for bar {bar}: {message}")]
    InvalidContext { bar: u32, message: String },
}

impl EngineError {
    /// Stable error code for machine-readable reporting.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidBarNumber { .. } => "STICK_001",
            EngineError::ScoreOutOfRange { .. } => "STICK_002",
            EngineError::EmptyIdentifier { .. } => "STICK_003",
            EngineError::InvalidWindowSize => "STICK_004",
            EngineError::InvalidDecayFactor { .. } => "STICK_005",
            EngineError::UnknownLimbPreset { .. } => "STICK_006",
            EngineError::UnknownLimb { .. } => "STICK_007",
            EngineError::UnknownStickingRule { .. } => "STICK_008",
            EngineError::InvalidBeat { .. } => "STICK_009",
            EngineError::InvalidSectionPlan { .. } => "STICK_010",
            EngineError::InvalidContext { .. } => "STICK_011",
        }
    }

    /// Error category for grouping in reports.
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::InvalidWindowSize
            | EngineError::InvalidDecayFactor { .. }
            | EngineError::UnknownLimbPreset { .. }
            | EngineError::UnknownLimb { .. }
            | EngineError::UnknownStickingRule { .. } => "config",
            EngineError::InvalidSectionPlan { .. } | EngineError::InvalidContext { .. } => {
                "context"
            }
            _ => "contract",
        }
    }
}

/// Rejects empty identifiers.
pub(crate) fn require_non_empty(value: &str, field: &'static str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::EmptyIdentifier { field });
    }
    Ok(())
}

/// Rejects bar numbers below 1.
pub(crate) fn require_bar(bar: u32) -> Result<(), EngineError> {
    if bar < 1 {
        return Err(EngineError::InvalidBarNumber { bar });
    }
    Ok(())
}
