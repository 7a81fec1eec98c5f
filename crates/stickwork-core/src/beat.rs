//! Fixed-precision beat positions.
//!
//! Positions are stored as integer ticks (960 per beat) so that two events
//! land on "the same instant" only when their tick counts are identical.
//! There is no floating tolerance anywhere in conflict detection.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EngineError;

/// A position within a bar, 1-based (beat 1.0 is the downbeat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Beat(i64);

impl Beat {
    /// Tick resolution. Divisible by 2, 3, 4, 5, 6, 8, 16 and 32.
    pub const TICKS_PER_BEAT: i64 = 960;

    /// Beat 1.0.
    pub const ONE: Beat = Beat(Self::TICKS_PER_BEAT);

    /// Creates a position from raw ticks.
    pub const fn from_ticks(ticks: i64) -> Self {
        Beat(ticks)
    }

    /// Creates a position on a whole beat.
    pub const fn whole(beat: u32) -> Self {
        Beat(beat as i64 * Self::TICKS_PER_BEAT)
    }

    /// Creates `whole + numerator / denominator`.
    ///
    /// The fraction must be representable exactly at the tick resolution.
    pub fn from_fraction(
        whole: u32,
        numerator: u32,
        denominator: u32,
    ) -> Result<Self, EngineError> {
        if denominator == 0 {
            return Err(EngineError::InvalidBeat {
                message: "denominator must be > 0".to_string(),
            });
        }
        let scaled = numerator as i64 * Self::TICKS_PER_BEAT;
        if scaled % denominator as i64 != 0 {
            return Err(EngineError::InvalidBeat {
                message: format!(
                    "{}/{} is not representable at {} ticks per beat",
                    numerator,
                    denominator,
                    Self::TICKS_PER_BEAT
                ),
            });
        }
        Ok(Beat(
            whole as i64 * Self::TICKS_PER_BEAT + scaled / denominator as i64,
        ))
    }

    /// Creates a position from a decimal beat value, rounded to the nearest tick.
    pub fn from_f64(beat: f64) -> Result<Self, EngineError> {
        if !beat.is_finite() || beat < 0.0 {
            return Err(EngineError::InvalidBeat {
                message: format!("beat {} must be finite and >= 0", beat),
            });
        }
        Ok(Beat((beat * Self::TICKS_PER_BEAT as f64).round() as i64))
    }

    /// Raw tick count.
    pub const fn ticks(self) -> i64 {
        self.0
    }

    /// Decimal beat value.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::TICKS_PER_BEAT as f64
    }

    /// Whole-beat part (1 for 1.75).
    pub const fn whole_part(self) -> i64 {
        self.0.div_euclid(Self::TICKS_PER_BEAT)
    }

    /// True when the position sits exactly on a whole beat.
    pub const fn is_on_beat(self) -> bool {
        self.0.rem_euclid(Self::TICKS_PER_BEAT) == 0
    }

    /// Offsets the position by a number of sixteenth notes.
    pub const fn plus_sixteenths(self, sixteenths: i64) -> Self {
        Beat(self.0 + sixteenths * (Self::TICKS_PER_BEAT / 4))
    }
}

impl Add for Beat {
    type Output = Beat;

    fn add(self, rhs: Beat) -> Beat {
        Beat(self.0 + rhs.0)
    }
}

impl Sub for Beat {
    type Output = Beat;

    fn sub(self, rhs: Beat) -> Beat {
        Beat(self.0 - rhs.0)
    }
}

impl fmt::Display for Beat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

impl Serialize for Beat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Beat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Beat::from_f64(value).map_err(serde::de::Error::custom)
    }
}
