//! Identifier newtypes and the exercise difficulty tier.

use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};

/// String wrapper for candidate identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    /// Create a new candidate ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CandidateId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// String wrapper for exercise identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(String);

impl ExerciseId {
    /// Create a new exercise ID from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ExerciseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExerciseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exercise difficulty, always within `1..=5`.
///
/// Deserialization rejects out-of-range values, so a `Tier` read back from a
/// persisted record is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    /// Easiest tier.
    pub const MIN: Tier = Tier(1);
    /// Hardest tier.
    pub const MAX: Tier = Tier(5);

    /// Create a tier, rejecting values outside `1..=5`.
    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN.0..=Self::MAX.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AssayError::InvalidTier(value))
        }
    }

    /// Create a tier, clamping into `1..=5`.
    #[must_use]
    pub fn saturating(value: u8) -> Self {
        Self(value.clamp(Self::MIN.0, Self::MAX.0))
    }

    /// Numeric value.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// One tier harder, capped at 5.
    #[must_use]
    pub fn up(self) -> Self {
        Self::saturating(self.0.saturating_add(1))
    }

    /// One tier easier, floored at 1.
    #[must_use]
    pub fn down(self) -> Self {
        Self::saturating(self.0.saturating_sub(1))
    }

    /// Absolute distance between two tiers.
    #[must_use]
    pub fn distance(self, other: Tier) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u8> for Tier {
    type Error = AssayError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.0
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_rejects_out_of_range() {
        assert!(Tier::new(0).is_err());
        assert!(Tier::new(6).is_err());
        assert_eq!(Tier::new(3).unwrap().get(), 3);
    }

    #[test]
    fn test_tier_moves_are_clamped() {
        assert_eq!(Tier::MAX.up(), Tier::MAX);
        assert_eq!(Tier::MIN.down(), Tier::MIN);
        assert_eq!(Tier::new(2).unwrap().up().get(), 3);
        assert_eq!(Tier::new(2).unwrap().down().get(), 1);
    }

    #[test]
    fn test_tier_distance() {
        let a = Tier::new(1).unwrap();
        let b = Tier::new(4).unwrap();
        assert_eq!(a.distance(b), 3);
        assert_eq!(b.distance(a), 3);
    }

    #[test]
    fn test_tier_deserialization_validates() {
        let tier: Tier = serde_json::from_str("4").unwrap();
        assert_eq!(tier.get(), 4);
        assert!(serde_json::from_str::<Tier>("9").is_err());
        assert_eq!(serde_json::to_string(&tier).unwrap(), "4");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = CandidateId::new("cand-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"cand-1\"");
        let ex: ExerciseId = "ex-7".into();
        assert_eq!(ex.to_string(), "ex-7");
    }
}
