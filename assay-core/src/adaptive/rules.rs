//! Tier transition rules.
//!
//! Evaluated in order against the latest result, first match wins:
//!
//! 1. no history → seed tier
//! 2. completed, under the fast-time fraction, quality above the escalate bar → up
//! 3. not completed, or quality under the de-escalate bar → down
//! 4. completed with reliance above the bar → stay, flagged
//! 5. completed → up; otherwise stay
//!
//! Moves are relative to the current tier and clamped to `1..=5`.

use crate::config::AdaptiveConfig;
use crate::types::Tier;

use super::types::{ExerciseResult, SelectionReason};

/// Target tier chosen by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierDecision {
    pub tier: Tier,
    pub reason: SelectionReason,
    pub flag_high_reliance: bool,
}

impl TierDecision {
    fn new(tier: Tier, reason: SelectionReason) -> Self {
        Self {
            tier,
            reason,
            flag_high_reliance: false,
        }
    }
}

/// Apply the transition rules to the latest result in `history`.
pub fn decide_tier(
    history: &[ExerciseResult],
    current: Tier,
    config: &AdaptiveConfig,
) -> TierDecision {
    let Some(latest) = history.last() else {
        return TierDecision::new(current, SelectionReason::FirstExercise);
    };

    let fast = latest
        .time_fraction()
        .is_some_and(|f| f < config.fast_time_fraction);

    if latest.completed && fast && latest.quality_score > config.escalate_quality {
        return TierDecision::new(current.up(), SelectionReason::FastHighQuality);
    }

    if !latest.completed || latest.quality_score < config.deescalate_quality {
        return TierDecision::new(current.down(), SelectionReason::StruggledOrLowQuality);
    }

    if latest.reliance_ratio > config.high_reliance {
        return TierDecision {
            tier: current,
            reason: SelectionReason::HighReliance,
            flag_high_reliance: true,
        };
    }

    if latest.completed {
        TierDecision::new(current.up(), SelectionReason::SteadyProgress)
    } else {
        TierDecision::new(current, SelectionReason::Holding)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn result(completed: bool, used: u64, quality: f64, reliance: f64) -> ExerciseResult {
        ExerciseResult {
            exercise_id: "ex".into(),
            tier: Tier::new(3).unwrap(),
            completed,
            time_used_ms: used,
            time_limit_ms: 100,
            quality_score: quality,
            reliance_ratio: reliance,
            topics: BTreeSet::new(),
        }
    }

    fn tier(n: u8) -> Tier {
        Tier::new(n).unwrap()
    }

    fn decide(history: &[ExerciseResult], current: u8) -> TierDecision {
        decide_tier(history, tier(current), &AdaptiveConfig::default())
    }

    #[test]
    fn test_empty_history_uses_seed_tier() {
        let decision = decide(&[], 3);
        assert_eq!(decision.tier, tier(3));
        assert_eq!(decision.reason, SelectionReason::FirstExercise);
    }

    #[test]
    fn test_fast_high_quality_escalates() {
        let decision = decide(&[result(true, 10, 0.8, 0.0)], 3);
        assert_eq!(decision.tier, tier(4));
        assert_eq!(decision.reason, SelectionReason::FastHighQuality);
    }

    #[test]
    fn test_escalation_is_capped() {
        assert_eq!(decide(&[result(true, 10, 0.8, 0.0)], 5).tier, tier(5));
    }

    #[test]
    fn test_not_completed_deescalates_regardless_of_quality() {
        for quality in [0.0, 0.5, 1.0] {
            let decision = decide(&[result(false, 100, quality, 0.0)], 3);
            assert_eq!(decision.tier, tier(2));
            assert_eq!(decision.reason, SelectionReason::StruggledOrLowQuality);
        }
        assert_eq!(decide(&[result(false, 100, 0.9, 0.0)], 1).tier, tier(1));
    }

    #[test]
    fn test_low_quality_deescalates() {
        assert_eq!(decide(&[result(true, 90, 0.3, 0.0)], 3).tier, tier(2));
    }

    #[test]
    fn test_high_reliance_holds_and_flags() {
        let decision = decide(&[result(true, 90, 0.5, 0.9)], 3);
        assert_eq!(decision.tier, tier(3));
        assert!(decision.flag_high_reliance);
        assert_eq!(decision.reason, SelectionReason::HighReliance);
    }

    #[test]
    fn test_fast_high_quality_wins_over_high_reliance() {
        let decision = decide(&[result(true, 10, 0.9, 0.95)], 3);
        assert_eq!(decision.tier, tier(4));
        assert!(!decision.flag_high_reliance);
    }

    #[test]
    fn test_ordinary_completion_escalates() {
        let decision = decide(&[result(true, 90, 0.5, 0.2)], 2);
        assert_eq!(decision.tier, tier(3));
        assert_eq!(decision.reason, SelectionReason::SteadyProgress);
    }

    #[test]
    fn test_only_latest_result_matters() {
        let history = [result(false, 100, 0.0, 0.0), result(true, 10, 0.8, 0.0)];
        assert_eq!(decide(&history, 3).tier, tier(4));
    }

    #[test]
    fn test_missing_time_limit_is_never_fast() {
        let mut r = result(true, 0, 0.9, 0.0);
        r.time_limit_ms = 0;
        let decision = decide(&[r], 3);
        assert_eq!(decision.reason, SelectionReason::SteadyProgress);
    }
}
