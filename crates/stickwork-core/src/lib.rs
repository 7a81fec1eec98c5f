//! Stickwork Core
//!
//! Deterministic, operator-driven drum performance generation.
//!
//! # Overview
//!
//! A performance is produced bar by bar. For each bar:
//!
//! 1. an [`AgentContext`] describes where the bar sits in the song;
//! 2. every applicable [`Operator`] proposes scored [`Candidate`] events;
//! 3. scores are rescaled by style weight and the [`AgentMemory`] repetition
//!    penalty;
//! 4. the [`PhysicalityFilter`] removes what a four-limbed drummer cannot
//!    play, plus anything over the bar's density cap;
//! 5. the survivors are recorded into memory and handed downstream.
//!
//! The [`StickingValidator`] is a separate, advisory pass over finished bars.
//!
//! # Determinism
//!
//! Given the same configuration and seed the output is identical across
//! runs. All randomness comes from PCG32 streams whose seeds are derived
//! with BLAKE3 from `(seed, stream key)`, and every aggregation iterates
//! ordered maps.
//!
//! # Example
//!
//! ```
//! use stickwork_core::{GenerationConfig, SectionType};
//!
//! let config = GenerationConfig::from_json(
//!     r#"{"seed": 42, "sections": [{"section_type": "verse", "bars": 4}]}"#,
//! )
//! .unwrap();
//! let performance = config.generate().unwrap();
//! assert_eq!(performance.bars.len(), 4);
//! assert_eq!(performance.bars[0].section_type, SectionType::Verse);
//! ```
//!
//! # Modules
//!
//! - [`limb`], [`conflict`]: limb model and conflict detection
//! - [`physicality`]: conflict resolution and density capping
//! - [`sticking`]: advisory ergonomics rules
//! - [`memory`]: windowed decision history and repetition penalty
//! - [`operator`]: operator contract and the built-in families
//! - [`generate`]: the orchestration loop
//! - [`config`], [`plan`], [`style`]: configuration
//! - [`rng`]: deterministic random streams

pub mod beat;
pub mod candidate;
pub mod config;
pub mod conflict;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod limb;
pub mod memory;
pub mod operator;
pub mod physicality;
pub mod plan;
pub mod rng;
pub mod role;
pub mod sticking;
pub mod style;

pub use beat::Beat;
pub use candidate::{Articulation, Candidate, FillRole, OnsetStrength};
pub use config::{ConfigError, GenerationConfig};
pub use conflict::{detect_candidate_conflicts, detect_conflicts, has_conflicts, LimbConflict};
pub use context::{AgentContext, AgentContextBuilder, SectionType};
pub use diagnostics::{DiagnosticLog, DiagnosticReason, FilterDiagnostic};
pub use error::EngineError;
pub use generate::{BarOutcome, Generator, Performance};
pub use limb::{Limb, LimbAssignment, LimbModel, LimbPreset};
pub use memory::{AgentMemory, DecayCurve, FillShape, MemoryConfig};
pub use operator::{DrumOperator, Operator, OperatorFamily};
pub use physicality::{PhysicalityFilter, PhysicalityRules, StrictnessLevel};
pub use plan::{SectionPlan, SectionSpec};
pub use role::Role;
pub use sticking::{StickingLimits, StickingReport, StickingRule, StickingValidator};
pub use style::StyleConfig;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
