//! Novelty-first exercise pick within a target tier.

use std::collections::BTreeSet;

use crate::types::{ExerciseId, Tier};

use super::types::{ExerciseResult, ExerciseSummary};

/// Choose an exercise for `target` from the unattempted part of `pool`.
///
/// Exercises whose topics share nothing with topics already seen are
/// preferred; if none exist the whole unattempted pool is used. Within that
/// pool an exact tier match wins, otherwise the closest tier, ties going to
/// the earlier pool entry. `None` means every exercise has been attempted.
pub fn pick_exercise<'a>(
    pool: &'a [ExerciseSummary],
    history: &[ExerciseResult],
    target: Tier,
) -> Option<&'a ExerciseSummary> {
    let attempted: BTreeSet<&ExerciseId> = history.iter().map(|r| &r.exercise_id).collect();
    let seen_topics: BTreeSet<&str> = history
        .iter()
        .flat_map(|r| r.topics.iter().map(String::as_str))
        .collect();

    let available: Vec<&ExerciseSummary> = pool
        .iter()
        .filter(|e| !attempted.contains(&e.id))
        .collect();

    let novel: Vec<&ExerciseSummary> = available
        .iter()
        .copied()
        .filter(|e| e.topics.iter().all(|t| !seen_topics.contains(t.as_str())))
        .collect();

    let candidates = if novel.is_empty() { available } else { novel };

    candidates
        .iter()
        .copied()
        .find(|e| e.tier == target)
        .or_else(|| {
            // min_by_key keeps the first of equal keys
            candidates.iter().copied().min_by_key(|e| e.tier.distance(target))
        })
}
