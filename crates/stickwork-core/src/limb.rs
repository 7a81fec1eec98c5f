//! Limb model: which physical limb performs each role.
//!
//! A [`LimbModel`] is immutable once built. Deriving a variant with
//! [`LimbModel::with_role_mapping`] shares the receiver's map until the
//! first write, so presets can be cloned freely.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::beat::Beat;
use crate::candidate::Candidate;
use crate::error::{require_non_empty, EngineError};
use crate::role::Role;

/// One of the four performing limbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limb {
    RightHand,
    LeftHand,
    RightFoot,
    LeftFoot,
}

impl Limb {
    pub const ALL: [Limb; 4] = [
        Limb::RightHand,
        Limb::LeftHand,
        Limb::RightFoot,
        Limb::LeftFoot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Limb::RightHand => "right_hand",
            Limb::LeftHand => "left_hand",
            Limb::RightFoot => "right_foot",
            Limb::LeftFoot => "left_foot",
        }
    }

    /// The same limb on the other side of the body.
    pub fn mirrored(&self) -> Limb {
        match self {
            Limb::RightHand => Limb::LeftHand,
            Limb::LeftHand => Limb::RightHand,
            Limb::RightFoot => Limb::LeftFoot,
            Limb::LeftFoot => Limb::RightFoot,
        }
    }
}

impl fmt::Display for Limb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Limb {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Limb::ALL
            .into_iter()
            .find(|limb| limb.as_str() == s)
            .ok_or_else(|| EngineError::UnknownLimb {
                name: s.to_string(),
            })
    }
}

/// Named limb configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LimbPreset {
    /// Cymbals on the right hand, snare and toms on the left, kick on the right foot.
    #[default]
    RightHanded,
    /// Hands swapped, feet unchanged.
    LeftHanded,
}

impl LimbPreset {
    pub const ALL: [LimbPreset; 2] = [LimbPreset::RightHanded, LimbPreset::LeftHanded];

    pub fn as_str(&self) -> &'static str {
        match self {
            LimbPreset::RightHanded => "right_handed",
            LimbPreset::LeftHanded => "left_handed",
        }
    }
}

impl FromStr for LimbPreset {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LimbPreset::ALL
            .into_iter()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| EngineError::UnknownLimbPreset {
                name: s.to_string(),
            })
    }
}

/// Immutable role → limb mapping.
///
/// Roles absent from the mapping have no required limb and never take part
/// in conflict detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimbModel {
    mapping: Arc<BTreeMap<Role, Limb>>,
}

impl LimbModel {
    /// Creates a model with no mappings.
    pub fn empty() -> Self {
        Self {
            mapping: Arc::new(BTreeMap::new()),
        }
    }

    /// Builds the model for a named preset.
    pub fn preset(preset: LimbPreset) -> Self {
        match preset {
            LimbPreset::RightHanded => Self::right_handed(),
            LimbPreset::LeftHanded => Self::left_handed(),
        }
    }

    /// Right-handed default kit.
    pub fn right_handed() -> Self {
        let mapping = BTreeMap::from([
            (Role::CLOSED_HAT, Limb::RightHand),
            (Role::OPEN_HAT, Limb::RightHand),
            (Role::RIDE, Limb::RightHand),
            (Role::CRASH, Limb::RightHand),
            (Role::SNARE, Limb::LeftHand),
            (Role::TOM_HIGH, Limb::LeftHand),
            (Role::TOM_MID, Limb::LeftHand),
            (Role::TOM_LOW, Limb::LeftHand),
            (Role::FLOOR_TOM, Limb::LeftHand),
            (Role::KICK, Limb::RightFoot),
            (Role::PEDAL_HAT, Limb::LeftFoot),
        ]);
        Self {
            mapping: Arc::new(mapping),
        }
    }

    /// Left-handed kit: every hand assignment mirrored, feet unchanged.
    pub fn left_handed() -> Self {
        let mapping = Self::right_handed()
            .mapping
            .iter()
            .map(|(role, limb)| {
                let limb = match limb {
                    Limb::RightHand | Limb::LeftHand => limb.mirrored(),
                    foot => *foot,
                };
                (role.clone(), limb)
            })
            .collect();
        Self {
            mapping: Arc::new(mapping),
        }
    }

    /// Returns the limb required to play `role`, or `None` when unmapped.
    pub fn required_limb(&self, role: &Role) -> Option<Limb> {
        self.mapping.get(role).copied()
    }

    /// Returns a new model with one mapping added or overridden.
    ///
    /// The receiver is left unchanged.
    pub fn with_role_mapping(&self, role: Role, limb: Limb) -> Result<Self, EngineError> {
        require_non_empty(role.as_str(), "role")?;
        let mut mapping = Arc::clone(&self.mapping);
        Arc::make_mut(&mut mapping).insert(role, limb);
        Ok(Self { mapping })
    }

    /// Applies a set of overrides on top of this model.
    pub fn with_overrides<'a>(
        &self,
        overrides: impl IntoIterator<Item = (&'a Role, &'a Limb)>,
    ) -> Result<Self, EngineError> {
        let mut model = self.clone();
        for (role, limb) in overrides {
            model = model.with_role_mapping(role.clone(), *limb)?;
        }
        Ok(model)
    }

    /// Every mapped role in sorted order.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.mapping.keys()
    }

    /// Every mapping in sorted role order.
    pub fn mappings(&self) -> impl Iterator<Item = (&Role, Limb)> {
        self.mapping.iter().map(|(role, limb)| (role, *limb))
    }

    /// Projects a candidate onto its limb, if its role is mapped.
    pub fn assign(&self, candidate: &Candidate) -> Option<LimbAssignment> {
        self.required_limb(&candidate.role)
            .map(|limb| LimbAssignment {
                bar: candidate.bar,
                beat: candidate.beat,
                role: candidate.role.clone(),
                limb,
            })
    }
}

impl Default for LimbModel {
    fn default() -> Self {
        Self::right_handed()
    }
}

/// A candidate projected through a limb model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LimbAssignment {
    pub bar: u32,
    pub beat: Beat,
    pub role: Role,
    pub limb: Limb,
}

impl LimbAssignment {
    pub fn new(bar: u32, beat: Beat, role: Role, limb: Limb) -> Self {
        Self {
            bar,
            beat,
            role,
            limb,
        }
    }

    /// Same bar and exactly the same beat.
    pub fn same_position(&self, other: &LimbAssignment) -> bool {
        self.bar == other.bar && self.beat == other.beat
    }

    /// Same limb at the same position, whatever the roles.
    pub fn conflicts_with(&self, other: &LimbAssignment) -> bool {
        self.limb == other.limb && self.same_position(other)
    }
}
