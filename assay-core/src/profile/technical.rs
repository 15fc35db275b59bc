//! Technical phase: exercises, quickfire questions and review issue detection.

use crate::adaptive::ExerciseResult;
use crate::scoring::Signal;

use super::types::{PhaseScore, QuickfireResponse, ReviewArtifacts};

const COMPLETION_WEIGHT: f64 = 0.4;
const QUICKFIRE_WEIGHT: f64 = 0.35;
const DETECTION_WEIGHT: f64 = 0.25;

/// Mean per-exercise credit. A completed exercise earns 0.6 plus 0.4 of its
/// quality; an unfinished one keeps 0.3 of its quality.
pub fn completion_score(results: &[ExerciseResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    let total: f64 = results
        .iter()
        .map(|r| {
            let quality = r.quality_score.clamp(0.0, 1.0);
            if r.completed {
                0.6 + 0.4 * quality
            } else {
                0.3 * quality
            }
        })
        .sum();
    Some(total / results.len() as f64)
}

/// Share of quickfire questions answered correctly.
pub fn quickfire_accuracy(responses: &[QuickfireResponse]) -> Option<f64> {
    if responses.is_empty() {
        return None;
    }
    let correct = responses.iter().filter(|r| r.correct).count();
    Some(correct as f64 / responses.len() as f64)
}

/// Share of planted issues found by at least one comment.
///
/// A comment finds an issue when it is anchored within `tolerance` lines of
/// it, or when its text names the issue's keyword.
pub fn detection_ratio(review: &ReviewArtifacts, tolerance: u32) -> Option<f64> {
    if review.planted_issues.is_empty() {
        return None;
    }

    let found = review
        .planted_issues
        .iter()
        .filter(|issue| {
            let keyword = issue.keyword.trim().to_lowercase();
            review.comments.iter().any(|comment| {
                let near = comment
                    .line
                    .is_some_and(|line| line.abs_diff(issue.line) <= tolerance);
                let named = !keyword.is_empty() && comment.body.to_lowercase().contains(&keyword);
                near || named
            })
        })
        .count();

    Some(found as f64 / review.planted_issues.len() as f64)
}

/// Technical phase score.
pub fn score_technical(
    results: &[ExerciseResult],
    quickfire: &[QuickfireResponse],
    review: &ReviewArtifacts,
    line_tolerance: u32,
) -> PhaseScore {
    PhaseScore::from_signals(&[
        Signal::optional("completion", completion_score(results), COMPLETION_WEIGHT),
        Signal::optional("quickfire_accuracy", quickfire_accuracy(quickfire), QUICKFIRE_WEIGHT),
        Signal::optional(
            "review_detection",
            detection_ratio(review, line_tolerance),
            DETECTION_WEIGHT,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::profile::types::{PlantedIssue, ReviewComment};
    use crate::types::Tier;

    fn result(id: &str, completed: bool, quality: f64) -> ExerciseResult {
        ExerciseResult {
            exercise_id: id.into(),
            tier: Tier::MIN,
            completed,
            time_used_ms: 50,
            time_limit_ms: 100,
            quality_score: quality,
            reliance_ratio: 0.2,
            topics: BTreeSet::new(),
        }
    }

    fn answer(correct: bool) -> QuickfireResponse {
        QuickfireResponse {
            question_id: "q".into(),
            answer: "a".into(),
            correct,
        }
    }

    fn issue(line: u32, keyword: &str) -> PlantedIssue {
        PlantedIssue {
            id: format!("issue-{line}"),
            line,
            keyword: keyword.into(),
        }
    }

    #[test]
    fn test_completion_credits_finished_work_more() {
        let score = completion_score(&[result("a", true, 1.0), result("b", false, 1.0)]).unwrap();
        assert!((score - (1.0 + 0.3) / 2.0).abs() < 1e-9);
        assert_eq!(completion_score(&[]), None);
    }

    #[test]
    fn test_quickfire_accuracy_is_share_correct() {
        let responses = [answer(true), answer(true), answer(false), answer(true)];
        assert_eq!(quickfire_accuracy(&responses), Some(0.75));
        assert_eq!(quickfire_accuracy(&[]), None);
    }

    #[test]
    fn test_detection_by_line_proximity_or_keyword() {
        let review = ReviewArtifacts {
            comments: vec![
                ReviewComment::new(Some(12), "this looks off"),
                ReviewComment::new(None, "Possible SQL injection through the query builder"),
            ],
            planted_issues: vec![
                issue(10, "overflow"),
                issue(40, "injection"),
                issue(80, "deadlock"),
            ],
        };
        let ratio = detection_ratio(&review, 2).unwrap();
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);

        let strict = detection_ratio(&review, 1).unwrap();
        assert!((strict - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_keyword_never_matches_by_name() {
        let review = ReviewArtifacts {
            comments: vec![ReviewComment::new(None, "anything")],
            planted_issues: vec![issue(5, "  ")],
        };
        assert_eq!(detection_ratio(&review, 2), Some(0.0));
    }

    #[test]
    fn test_full_marks_score_ten() {
        let review = ReviewArtifacts {
            comments: vec![ReviewComment::new(Some(3), "bug")],
            planted_issues: vec![issue(3, "bug")],
        };
        let score = score_technical(&[result("a", true, 1.0)], &[answer(true)], &review, 2);
        assert_eq!(score.score, 10.0);
        assert_eq!(score.breakdown.len(), 3);
    }

    #[test]
    fn test_weights_renormalize_over_present_components() {
        let responses = [answer(true), answer(false)];
        let score = score_technical(&[], &responses, &ReviewArtifacts::default(), 2);
        assert_eq!(score.score, 5.5);
        assert_eq!(score.breakdown.len(), 1);
        assert_eq!(score.breakdown.get("quickfire_accuracy"), Some(&0.5));
    }

    #[test]
    fn test_nothing_submitted_scores_one() {
        let score = score_technical(&[], &[], &ReviewArtifacts::default(), 2);
        assert_eq!(score, PhaseScore::no_data());
    }
}
