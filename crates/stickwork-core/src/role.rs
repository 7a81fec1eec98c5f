//! Playing roles (kit surfaces).

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{require_non_empty, EngineError};

/// An opaque identifier for a playable surface.
///
/// The common kit pieces are available as constants; any other non-empty
/// string (e.g. a studio-only texture role) is a valid role too.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const KICK: Role = Role(Cow::Borrowed("kick"));
    pub const SNARE: Role = Role(Cow::Borrowed("snare"));
    pub const CLOSED_HAT: Role = Role(Cow::Borrowed("closed_hat"));
    pub const OPEN_HAT: Role = Role(Cow::Borrowed("open_hat"));
    pub const PEDAL_HAT: Role = Role(Cow::Borrowed("pedal_hat"));
    pub const RIDE: Role = Role(Cow::Borrowed("ride"));
    pub const CRASH: Role = Role(Cow::Borrowed("crash"));
    pub const TOM_HIGH: Role = Role(Cow::Borrowed("tom_high"));
    pub const TOM_MID: Role = Role(Cow::Borrowed("tom_mid"));
    pub const TOM_LOW: Role = Role(Cow::Borrowed("tom_low"));
    pub const FLOOR_TOM: Role = Role(Cow::Borrowed("floor_tom"));

    /// Toms ordered from lowest to highest pitch.
    pub const TOMS_LOW_TO_HIGH: [Role; 4] = [
        Role::FLOOR_TOM,
        Role::TOM_LOW,
        Role::TOM_MID,
        Role::TOM_HIGH,
    ];

    /// Creates a role from an arbitrary identifier.
    pub fn new(name: impl Into<String>) -> Result<Self, EngineError> {
        let name = name.into();
        require_non_empty(&name, "role")?;
        Ok(Role(Cow::Owned(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for cymbal-family roles (hats, ride, crash).
    pub fn is_cymbal(&self) -> bool {
        matches!(
            self.as_str(),
            "closed_hat" | "open_hat" | "ride" | "crash"
        )
    }

    /// True for any tom.
    pub fn is_tom(&self) -> bool {
        Role::TOMS_LOW_TO_HIGH.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
