//! Grammatical parameter vectors
//!
//! A [`ParameterVector`] holds one small category code per grammatical
//! category (part of speech, case, number, gender, ...). The value `0`
//! means "unknown" and acts as a wildcard in every comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of grammatical categories carried by every vector
pub const PARAMETER_COUNT: usize = 10;

/// Category code meaning "not determined"
pub const UNKNOWN: u8 = 0;

/// Fixed-length vector of grammatical category codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ParameterVector([u8; PARAMETER_COUNT]);

impl ParameterVector {
    /// Create a vector with every slot unknown
    #[inline]
    pub const fn new() -> Self {
        Self([UNKNOWN; PARAMETER_COUNT])
    }

    /// Create a vector from a full array of codes
    #[inline]
    pub const fn from_array(values: [u8; PARAMETER_COUNT]) -> Self {
        Self(values)
    }

    /// Create a vector from a prefix of codes, remaining slots unknown
    ///
    /// Returns `None` if more than [`PARAMETER_COUNT`] values are given.
    pub fn from_slice(values: &[u8]) -> Option<Self> {
        if values.len() > PARAMETER_COUNT {
            return None;
        }
        let mut vector = Self::new();
        vector.0[..values.len()].copy_from_slice(values);
        Some(vector)
    }

    /// Builder-style slot assignment
    ///
    /// Out-of-range slots are ignored.
    #[inline]
    pub fn with(mut self, slot: usize, value: u8) -> Self {
        self.set(slot, value);
        self
    }

    /// Get the code in a slot (unknown for out-of-range slots)
    #[inline]
    pub fn get(&self, slot: usize) -> u8 {
        self.0.get(slot).copied().unwrap_or(UNKNOWN)
    }

    /// Set the code in a slot
    #[inline]
    pub fn set(&mut self, slot: usize, value: u8) {
        if let Some(target) = self.0.get_mut(slot) {
            *target = value;
        }
    }

    /// Raw codes
    #[inline]
    pub fn as_array(&self) -> &[u8; PARAMETER_COUNT] {
        &self.0
    }

    /// Whether a slot is unknown
    #[inline]
    pub fn is_unknown(&self, slot: usize) -> bool {
        self.get(slot) == UNKNOWN
    }

    /// Whether at least one slot is unknown
    #[inline]
    pub fn has_unknown(&self) -> bool {
        self.0.iter().any(|&v| v == UNKNOWN)
    }

    /// Whether every slot is unknown
    #[inline]
    pub fn is_fully_unknown(&self) -> bool {
        self.0.iter().all(|&v| v == UNKNOWN)
    }

    /// Number of known slots
    #[inline]
    pub fn known_count(&self) -> usize {
        self.0.iter().filter(|&&v| v != UNKNOWN).count()
    }

    /// Fill every unknown slot of `self` with the known value of `other`
    ///
    /// Known slots of `self` are never touched. Returns whether any slot
    /// changed.
    pub fn override_by(&mut self, other: &ParameterVector) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            if *mine == UNKNOWN && *theirs != UNKNOWN {
                *mine = *theirs;
                changed = true;
            }
        }
        changed
    }

    /// Copy of `self` with unknown slots filled from `other`
    #[inline]
    pub fn overridden_by(&self, other: &ParameterVector) -> ParameterVector {
        let mut result = *self;
        result.override_by(other);
        result
    }

    /// Per-slot common value across all vectors, unknown where they differ
    ///
    /// An empty input yields the all-unknown vector.
    pub fn collective<'a, I>(vectors: I) -> ParameterVector
    where
        I: IntoIterator<Item = &'a ParameterVector>,
    {
        let mut iter = vectors.into_iter();
        let Some(first) = iter.next() else {
            return ParameterVector::new();
        };
        let mut result = *first;
        for vector in iter {
            for (slot, value) in result.0.iter_mut().zip(vector.0.iter()) {
                if *slot != *value {
                    *slot = UNKNOWN;
                }
            }
        }
        result
    }

    /// Whether `other` can be absorbed into `self`
    ///
    /// True iff every known slot of `other` equals the slot of `self` or
    /// `self` is unknown there.
    pub fn accepts(&self, other: &ParameterVector) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(&mine, &theirs)| theirs == UNKNOWN || mine == UNKNOWN || mine == theirs)
    }

    /// Whether both vectors hold different known values in some slot
    #[inline]
    pub fn conflicts_with(&self, other: &ParameterVector) -> bool {
        !self.accepts(other)
    }

    /// Whether every known slot of `pattern` is equal in `self`
    ///
    /// Unlike [`accepts`](Self::accepts), an unknown slot in `self` does
    /// not satisfy a known slot of `pattern`.
    pub fn satisfies(&self, pattern: &ParameterVector) -> bool {
        self.0
            .iter()
            .zip(pattern.0.iter())
            .all(|(&mine, &wanted)| wanted == UNKNOWN || mine == wanted)
    }

    /// Iterate over `(slot, value)` pairs of known slots
    pub fn known(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != UNKNOWN)
            .map(|(i, v)| (i, *v))
    }
}

impl From<[u8; PARAMETER_COUNT]> for ParameterVector {
    fn from(values: [u8; PARAMETER_COUNT]) -> Self {
        Self(values)
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if *value == UNKNOWN {
                f.write_str("_")?;
            } else {
                write!(f, "{}", value)?;
            }
        }
        f.write_str("]")
    }
}
