//! Selection entry points and the event-emitting engine wrapper.

use std::sync::Arc;

use tracing::debug;

use crate::config::AdaptiveConfig;
use crate::error::{AssayError, Result};
use crate::events::{EventSink, NoOpEventSink, ScoringEvent};
use crate::types::Tier;

use super::rules::decide_tier;
use super::selection::pick_exercise;
use super::types::{ExerciseResult, ExerciseSummary, NextExercise, Selection};

/// Decide the next exercise. Pure.
pub fn select_next(
    history: &[ExerciseResult],
    pool: &[ExerciseSummary],
    current: Tier,
    config: &AdaptiveConfig,
) -> Selection {
    let decision = decide_tier(history, current, config);

    match pick_exercise(pool, history, decision.tier) {
        Some(exercise) => Selection::Next(NextExercise {
            exercise_id: exercise.id.clone(),
            tier: exercise.tier,
            target_tier: decision.tier,
            reason: decision.reason,
            flag_high_reliance: decision.flag_high_reliance,
        }),
        None => Selection::Exhausted,
    }
}

/// Append a result to the session history.
///
/// A second result for the same exercise is rejected, which keeps retried
/// writes from double-counting.
pub fn record_result(history: &mut Vec<ExerciseResult>, result: ExerciseResult) -> Result<()> {
    if history.iter().any(|r| r.exercise_id == result.exercise_id) {
        return Err(AssayError::DuplicateResult(result.exercise_id.to_string()));
    }
    history.push(result);
    Ok(())
}

/// [`select_next`] with configuration and event emission attached.
pub struct AdaptiveEngine {
    config: AdaptiveConfig,
    sink: Arc<dyn EventSink>,
}

impl AdaptiveEngine {
    pub fn new(config: AdaptiveConfig) -> Self {
        Self {
            config,
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Send selection events to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    /// Decide the next exercise and emit the outcome.
    pub fn next(
        &self,
        history: &[ExerciseResult],
        pool: &[ExerciseSummary],
        current: Tier,
    ) -> Selection {
        let selection = select_next(history, pool, current, &self.config);

        match &selection {
            Selection::Next(next) => {
                debug!(
                    exercise_id = %next.exercise_id,
                    tier = %next.tier,
                    target_tier = %next.target_tier,
                    reason = %next.reason,
                    flag_high_reliance = next.flag_high_reliance,
                    "selected next exercise"
                );
                self.sink.emit(ScoringEvent::ExerciseSelected {
                    exercise_id: next.exercise_id.clone(),
                    tier: next.tier,
                    reason: next.reason.to_string(),
                    flag_high_reliance: next.flag_high_reliance,
                });
            }
            Selection::Exhausted => {
                debug!(attempted = history.len(), "exercise pool exhausted");
                self.sink.emit(ScoringEvent::PoolExhausted {
                    attempted: history.len(),
                });
            }
        }

        selection
    }

    /// Record `result` and decide what follows it.
    ///
    /// The tier the candidate was working at becomes the current tier.
    pub fn advance(
        &self,
        history: &mut Vec<ExerciseResult>,
        result: ExerciseResult,
        pool: &[ExerciseSummary],
    ) -> Result<Selection> {
        let current = result.tier;
        record_result(history, result)?;
        Ok(self.next(history, pool, current))
    }
}

impl Default for AdaptiveEngine {
    fn default() -> Self {
        Self::new(AdaptiveConfig::default())
    }
}

impl std::fmt::Debug for AdaptiveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
