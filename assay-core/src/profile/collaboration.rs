//! Collaboration phase: how the candidate worked with the assistant.
//!
//! Three components:
//!
//! - **prompt quality**: each prompt earns a third for reaching the minimum
//!   length, a third for concrete context (code spans, identifiers, error
//!   text) and a third for stating a constraint or intent;
//! - **verification**: share of accepted suggestions followed by a test run
//!   before the next acceptance;
//! - **independence**: one minus mean reliance across exercise results.

use std::sync::LazyLock;

use regex::Regex;

use crate::adaptive::ExerciseResult;
use crate::scoring::{InteractionEvent, Signal};

use super::types::PhaseScore;

const PROMPT_QUALITY_WEIGHT: f64 = 0.4;
const VERIFICATION_WEIGHT: f64 = 0.3;
const INDEPENDENCE_WEIGHT: f64 = 0.3;

static CONCRETE_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"`[^`]+`|\b[a-z]+_[a-z0-9_]+\b|\b[a-z]+[A-Z][A-Za-z0-9]*\b|\w+::\w+|\w+\(\)",
        r"|(?i:\b(error|panic|exception|traceback|line \d+)\b)",
    ))
    .expect("context pattern is valid")
});

static INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(should|must|without|only|avoid|ensure|instead|keep|so that|because",
        r"|need|want|don't|do not)\b",
    ))
    .expect("intent pattern is valid")
});

/// Quality of a single prompt in `[0, 1]`.
pub fn prompt_quality(text: &str, min_chars: usize) -> f64 {
    let text = text.trim();
    let checks = [
        text.chars().count() >= min_chars,
        CONCRETE_CONTEXT.is_match(text),
        INTENT.is_match(text),
    ];
    checks.iter().filter(|&&passed| passed).count() as f64 / checks.len() as f64
}

/// Mean prompt quality, `None` when the candidate never prompted.
pub fn prompt_quality_score(events: &[InteractionEvent], min_chars: usize) -> Option<f64> {
    let scores: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            InteractionEvent::Prompt { text, .. } => Some(prompt_quality(text, min_chars)),
            _ => None,
        })
        .collect();

    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Share of suggestion outcomes that were verified.
///
/// Events are taken in timestamp order. An accepted suggestion is verified by
/// a test run that comes before the next acceptance. Rejected suggestions need
/// no verification and count as verified. `None` without any outcome.
pub fn verification_score(events: &[InteractionEvent]) -> Option<f64> {
    let mut ordered: Vec<&InteractionEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.timestamp_ms());

    let mut outcomes = 0usize;
    let mut verified = 0usize;
    let mut pending = false;

    for event in ordered {
        match event {
            InteractionEvent::SuggestionOutcome { acceptance, .. } => {
                outcomes += 1;
                if acceptance.is_accepted() {
                    pending = true;
                } else {
                    verified += 1;
                }
            }
            InteractionEvent::TestRun { .. } if pending => {
                verified += 1;
                pending = false;
            }
            _ => {}
        }
    }

    if outcomes == 0 {
        return None;
    }
    Some(verified as f64 / outcomes as f64)
}

/// One minus mean reliance, `None` without results.
pub fn independence_score(results: &[ExerciseResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    let mean = results
        .iter()
        .map(|r| r.reliance_ratio.clamp(0.0, 1.0))
        .sum::<f64>()
        / results.len() as f64;
    Some(1.0 - mean)
}

/// Collaboration phase score.
pub fn score_collaboration(
    events: &[InteractionEvent],
    results: &[ExerciseResult],
    prompt_min_chars: usize,
) -> PhaseScore {
    PhaseScore::from_signals(&[
        Signal::optional(
            "prompt_quality",
            prompt_quality_score(events, prompt_min_chars),
            PROMPT_QUALITY_WEIGHT,
        ),
        Signal::optional("verification", verification_score(events), VERIFICATION_WEIGHT),
        Signal::optional("independence", independence_score(results), INDEPENDENCE_WEIGHT),
    ])
}
