//! AI-reliance scoring.
//!
//! Two estimates of how much of the final code came from the assistant:
//!
//! - **event-based**: accepted suggestions reported by the in-app chat
//!   widget, measured in lines against the final submission;
//! - **terminal-based**: how much of the terminal session the assistant CLI
//!   owned, from [`BehavioralMetrics`].
//!
//! The terminal estimate sees every assistant CLI invocation, the widget only
//! sees its own traffic, so the terminal estimate dominates when both exist.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::telemetry::BehavioralMetrics;

use super::signal::{BlendPolicy, Signal, weighted_sum};

const TERMINAL: &str = "terminal";
const EVENTS: &str = "events";

/// How the candidate handled an assistant suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    Full,
    Partial,
    Rejected,
}

impl Acceptance {
    /// Share of the suggestion's lines credited to the assistant.
    pub fn line_weight(self) -> f64 {
        match self {
            Self::Full => 1.0,
            Self::Partial => 0.5,
            Self::Rejected => 0.0,
        }
    }

    /// Whether any part of the suggestion was kept. Partial counts.
    pub fn is_accepted(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// An interaction with the in-app assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionEvent {
    /// The candidate sent a prompt.
    Prompt { timestamp_ms: i64, text: String },
    /// The candidate accepted, partially accepted or rejected a suggestion.
    SuggestionOutcome {
        timestamp_ms: i64,
        acceptance: Acceptance,
        suggested_text: String,
    },
    /// The candidate ran the test suite.
    TestRun {
        timestamp_ms: i64,
        passed: u32,
        failed: u32,
    },
}

impl InteractionEvent {
    pub fn timestamp_ms(&self) -> i64 {
        match self {
            Self::Prompt { timestamp_ms, .. }
            | Self::SuggestionOutcome { timestamp_ms, .. }
            | Self::TestRun { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}

/// Both estimates and the blended reliance ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelianceBreakdown {
    pub event: Option<f64>,
    pub terminal: Option<f64>,
    pub ratio: f64,
}

fn policy() -> BlendPolicy {
    BlendPolicy::new()
        .rule(&[TERMINAL, EVENTS], &[(TERMINAL, 0.7), (EVENTS, 0.3)])
        .rule(&[TERMINAL], &[(TERMINAL, 1.0)])
        .rule(&[], &[(EVENTS, 1.0)])
}

/// Credited suggestion lines over final code lines.
///
/// `None` when no suggestion outcome was reported.
pub fn event_estimate(events: &[InteractionEvent], final_code: &str) -> Option<f64> {
    let mut reported = false;
    let mut credited = 0.0;

    for event in events {
        if let InteractionEvent::SuggestionOutcome {
            acceptance,
            suggested_text,
            ..
        } = event
        {
            reported = true;
            credited += suggested_text.lines().count() as f64 * acceptance.line_weight();
        }
    }

    if !reported {
        return None;
    }

    let final_lines = final_code.lines().count();
    if final_lines == 0 {
        return Some(0.0);
    }
    Some((credited / final_lines as f64).clamp(0.0, 1.0))
}

/// Reliance implied by terminal behavior.
pub fn terminal_estimate(metrics: &BehavioralMetrics) -> f64 {
    let signals = [
        Signal::new("time_in_assistant", metrics.time_in_assistant_ratio, 0.3),
        Signal::new("assistant_output", metrics.assistant_output_ratio, 0.4),
        Signal::new("non_manual", 1.0 - metrics.manual_activity_ratio, 0.3),
    ];
    weighted_sum(&signals).clamp(0.0, 1.0)
}

/// Reliance breakdown. Higher means more of the final code is attributed to
/// the assistant.
pub fn reliance_breakdown(
    events: &[InteractionEvent],
    final_code: &str,
    metrics: Option<&BehavioralMetrics>,
) -> RelianceBreakdown {
    let event = event_estimate(events, final_code);
    let terminal = metrics.map(terminal_estimate);

    let signals = [
        Signal::optional(EVENTS, event, 1.0),
        Signal::optional(TERMINAL, terminal, 1.0),
    ];
    let ratio = policy().blend(&signals).unwrap_or(0.0);

    debug!(?event, ?terminal, ratio, "reliance blend");
    RelianceBreakdown {
        event,
        terminal,
        ratio,
    }
}

/// Reliance ratio in `[0, 1]`.
pub fn score_reliance(
    events: &[InteractionEvent],
    final_code: &str,
    metrics: Option<&BehavioralMetrics>,
) -> f64 {
    reliance_breakdown(events, final_code, metrics).ratio
}
