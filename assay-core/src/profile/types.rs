//! Profile records and the artifacts they are computed from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::adaptive::ExerciseResult;
use crate::scoring::{InteractionEvent, Signal, normalized_sum};
use crate::types::CandidateId;

/// Lowest phase score; also the score of a phase with no data.
pub const MIN_PHASE_SCORE: f64 = 1.0;
/// Highest phase score.
pub const MAX_PHASE_SCORE: f64 = 10.0;

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score for one interview phase, 1 to 10, with the components behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseScore {
    pub score: f64,
    /// Component values in `[0, 1]`, keyed by component name.
    pub breakdown: BTreeMap<String, f64>,
}

impl PhaseScore {
    /// Score for a phase the candidate produced nothing for.
    pub fn no_data() -> Self {
        Self {
            score: MIN_PHASE_SCORE,
            breakdown: BTreeMap::new(),
        }
    }

    /// Map the weighted mean of the available components onto 1..=10.
    pub fn from_signals(signals: &[Signal]) -> Self {
        let Some(mean) = normalized_sum(signals) else {
            return Self::no_data();
        };

        let breakdown = signals
            .iter()
            .filter(|s| s.available)
            .map(|s| (s.name.clone(), s.value))
            .collect();
        let scaled = MIN_PHASE_SCORE + (MAX_PHASE_SCORE - MIN_PHASE_SCORE) * mean.clamp(0.0, 1.0);

        Self {
            score: round_one_decimal(scaled),
            breakdown,
        }
    }

    /// Whether any sub-score contributed. A phase without data has an empty
    /// breakdown and the minimum score.
    pub fn has_data(&self) -> bool {
        !self.breakdown.is_empty()
    }
}

impl Default for PhaseScore {
    fn default() -> Self {
        Self::no_data()
    }
}

/// Hiring recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongHire,
    Hire,
    LeanHire,
    NoHire,
}

impl Recommendation {
    /// Deterministic recommendation from the overall score.
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 8.0 {
            Self::StrongHire
        } else if overall >= 6.5 {
            Self::Hire
        } else if overall >= 5.0 {
            Self::LeanHire
        } else {
            Self::NoHire
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StrongHire => "strong_hire",
            Self::Hire => "hire",
            Self::LeanHire => "lean_hire",
            Self::NoHire => "no_hire",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the profile's narrative came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeStatus {
    /// Written by the narrative generator.
    Generated,
    /// Generator failed; narrative is empty and the recommendation is score-derived.
    Fallback,
}

/// Answer to one quickfire question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickfireResponse {
    pub question_id: String,
    #[serde(default)]
    pub answer: String,
    pub correct: bool,
}

/// A comment left during the code review phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    /// Line the comment is anchored to, if any.
    #[serde(default)]
    pub line: Option<u32>,
    pub body: String,
}

impl ReviewComment {
    pub fn new(line: Option<u32>, body: impl Into<String>) -> Self {
        Self {
            line,
            body: body.into(),
        }
    }
}

/// An issue deliberately planted in the review snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantedIssue {
    pub id: String,
    pub line: u32,
    /// Word that identifies the issue when a comment names it.
    pub keyword: String,
}

/// Everything the review phase produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewArtifacts {
    #[serde(default)]
    pub comments: Vec<ReviewComment>,
    #[serde(default)]
    pub planted_issues: Vec<PlantedIssue>,
}

/// All artifacts accumulated for a candidate over a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateArtifacts {
    pub results: Vec<ExerciseResult>,
    pub interactions: Vec<InteractionEvent>,
    pub review: ReviewArtifacts,
    pub quickfire: Vec<QuickfireResponse>,
}

/// Final assessment of a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate_id: CandidateId,
    pub technical: PhaseScore,
    pub collaboration: PhaseScore,
    pub communication: PhaseScore,
    /// Mean of the three phase scores, one decimal.
    pub overall: f64,
    pub narrative: String,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    pub narrative_status: NarrativeStatus,
}

/// Overall score from the three phase scores.
pub fn overall_score(
    technical: &PhaseScore,
    collaboration: &PhaseScore,
    communication: &PhaseScore,
) -> f64 {
    round_one_decimal((technical.score + collaboration.score + communication.score) / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_score_scales_onto_one_to_ten() {
        let full =
            PhaseScore::from_signals(&[Signal::new("a", 1.0, 0.5), Signal::new("b", 1.0, 0.5)]);
        assert_eq!(full.score, 10.0);

        let half = PhaseScore::from_signals(&[Signal::new("a", 0.5, 1.0)]);
        assert_eq!(half.score, 5.5);

        let zero = PhaseScore::from_signals(&[Signal::new("a", 0.0, 1.0)]);
        assert_eq!(zero.score, 1.0);
        assert!(zero.has_data());
    }

    #[test]
    fn test_phase_score_rounds_to_one_decimal() {
        let score = PhaseScore::from_signals(&[Signal::new("a", 1.0 / 3.0, 1.0)]);
        assert_eq!(score.score, 4.0);
        let score = PhaseScore::from_signals(&[Signal::new("a", 0.123, 1.0)]);
        assert_eq!(score.score, 2.1);
    }

    #[test]
    fn test_missing_components_are_left_out() {
        let score = PhaseScore::from_signals(&[
            Signal::new("present", 1.0, 0.4),
            Signal::optional("absent", None, 0.6),
        ]);
        assert_eq!(score.score, 10.0);
        assert_eq!(score.breakdown.len(), 1);
        assert!(score.breakdown.contains_key("present"));
    }

    #[test]
    fn test_no_signals_is_minimum_with_empty_breakdown() {
        let score = PhaseScore::from_signals(&[Signal::optional("x", None, 1.0)]);
        assert_eq!(score, PhaseScore::no_data());
        assert_eq!(score.score, 1.0);
        assert!(!score.has_data());
    }

    #[test]
    fn test_recommendation_thresholds() {
        assert_eq!(Recommendation::from_overall(9.0), Recommendation::StrongHire);
        assert_eq!(Recommendation::from_overall(8.0), Recommendation::StrongHire);
        assert_eq!(Recommendation::from_overall(7.9), Recommendation::Hire);
        assert_eq!(Recommendation::from_overall(6.5), Recommendation::Hire);
        assert_eq!(Recommendation::from_overall(5.0), Recommendation::LeanHire);
        assert_eq!(Recommendation::from_overall(4.9), Recommendation::NoHire);
        assert_eq!(Recommendation::from_overall(1.0), Recommendation::NoHire);
    }

    #[test]
    fn test_recommendation_serializes_snake_case() {
        let json = serde_json::to_string(&Recommendation::StrongHire).unwrap();
        assert_eq!(json, "\"strong_hire\"");
        let parsed: Recommendation = serde_json::from_str("\"lean_hire\"").unwrap();
        assert_eq!(parsed, Recommendation::LeanHire);
        assert_eq!(Recommendation::NoHire.to_string(), "no_hire");
    }

    #[test]
    fn test_overall_is_mean_of_phases() {
        let a = PhaseScore::from_signals(&[Signal::new("a", 1.0, 1.0)]);
        let b = PhaseScore::from_signals(&[Signal::new("b", 0.5, 1.0)]);
        let c = PhaseScore::no_data();
        assert_eq!(overall_score(&a, &b, &c), 5.5);
    }

    #[test]
    fn test_profile_json_round_trip() {
        let mut breakdown = BTreeMap::new();
        breakdown.insert("completion".to_string(), 0.75);
        let profile = CandidateProfile {
            candidate_id: "cand-1".into(),
            technical: PhaseScore {
                score: 7.8,
                breakdown,
            },
            collaboration: PhaseScore::no_data(),
            communication: PhaseScore::no_data(),
            overall: 3.3,
            narrative: String::new(),
            recommendation: Recommendation::NoHire,
            strengths: vec![],
            concerns: vec!["little review output".into()],
            narrative_status: NarrativeStatus::Fallback,
        };

        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"narrative_status\":\"fallback\""));
        let parsed: CandidateProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile);
    }
}
