//! Exercise history and selection records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{ExerciseId, Tier};

/// Outcome of one attempted exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub exercise_id: ExerciseId,
    pub tier: Tier,
    pub completed: bool,
    pub time_used_ms: u64,
    pub time_limit_ms: u64,
    /// Code-quality score in `[0, 1]`.
    pub quality_score: f64,
    /// AI-reliance ratio in `[0, 1]`.
    pub reliance_ratio: f64,
    #[serde(default)]
    pub topics: BTreeSet<String>,
}

impl ExerciseResult {
    /// Share of the time limit used, `None` without a limit.
    pub fn time_fraction(&self) -> Option<f64> {
        if self.time_limit_ms == 0 {
            None
        } else {
            Some(self.time_used_ms as f64 / self.time_limit_ms as f64)
        }
    }
}

/// An exercise that can be offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub id: ExerciseId,
    pub tier: Tier,
    #[serde(default)]
    pub topics: BTreeSet<String>,
}

impl ExerciseSummary {
    /// Pool entry for exercise `id` at `tier` covering `topics`.
    pub fn new<I, S>(id: impl Into<ExerciseId>, tier: Tier, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            tier,
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }
}

/// Why the engine chose the tier it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// No history yet; start at the seed tier.
    FirstExercise,
    /// Finished quickly with good quality.
    FastHighQuality,
    /// Did not finish, or quality was poor.
    StruggledOrLowQuality,
    /// Finished, but leaned heavily on the assistant.
    HighReliance,
    /// Finished without standing out either way.
    SteadyProgress,
    /// Fallback hold.
    Holding,
}

impl SelectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstExercise => "first exercise",
            Self::FastHighQuality => "completed quickly with high quality",
            Self::StruggledOrLowQuality => "not completed or low quality",
            Self::HighReliance => "completed with high AI reliance",
            Self::SteadyProgress => "completed",
            Self::Holding => "holding tier",
        }
    }
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The exercise to offer next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextExercise {
    pub exercise_id: ExerciseId,
    /// Tier of the chosen exercise.
    pub tier: Tier,
    /// Tier the rules asked for; differs from `tier` when the pool had no
    /// exact match.
    pub target_tier: Tier,
    pub reason: SelectionReason,
    /// Set when the latest result should be reviewed for AI over-reliance.
    #[serde(default)]
    pub flag_high_reliance: bool,
}

/// Result of asking for the next exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Selection {
    Next(NextExercise),
    /// Every exercise in the pool has been attempted.
    Exhausted,
}

impl Selection {
    /// Whether every exercise in the pool has already been attempted.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// The chosen exercise, `None` when the pool is exhausted.
    pub fn next(&self) -> Option<&NextExercise> {
        match self {
            Self::Next(next) => Some(next),
            Self::Exhausted => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_fraction_handles_missing_limit() {
        let mut result = ExerciseResult {
            exercise_id: "ex".into(),
            tier: Tier::MIN,
            completed: true,
            time_used_ms: 30,
            time_limit_ms: 120,
            quality_score: 0.5,
            reliance_ratio: 0.1,
            topics: BTreeSet::new(),
        };
        assert_eq!(result.time_fraction(), Some(0.25));
        result.time_limit_ms = 0;
        assert_eq!(result.time_fraction(), None);
    }

    #[test]
    fn test_selection_serializes_with_status() {
        let json = serde_json::to_string(&Selection::Exhausted).unwrap();
        assert_eq!(json, r#"{"status":"exhausted"}"#);

        let next = Selection::Next(NextExercise {
            exercise_id: "ex-1".into(),
            tier: Tier::MAX,
            target_tier: Tier::MAX,
            reason: SelectionReason::FastHighQuality,
            flag_high_reliance: false,
        });
        let json = serde_json::to_string(&next).unwrap();
        assert!(json.contains(r#""status":"next""#));
        assert!(json.contains(r#""reason":"fast_high_quality""#));
        let parsed: Selection = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, next);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(SelectionReason::FirstExercise.to_string(), "first exercise");
    }
}
