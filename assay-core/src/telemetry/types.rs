//! Telemetry records and the derived behavioral metrics.

use serde::{Deserialize, Serialize};

/// Which way the bytes travelled through the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Candidate keystrokes.
    #[serde(alias = "input")]
    In,
    /// Terminal output.
    #[serde(alias = "output")]
    Out,
}

/// One captured chunk of terminal I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub direction: Direction,
    /// Raw text, escape sequences included.
    pub text: String,
}

impl TelemetryEvent {
    /// Keystroke event.
    pub fn input(timestamp_ms: i64, text: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            direction: Direction::In,
            text: text.into(),
        }
    }

    /// Terminal output event.
    pub fn output(timestamp_ms: i64, text: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            direction: Direction::Out,
            text: text.into(),
        }
    }

    /// Raw byte length as transmitted.
    pub fn byte_len(&self) -> u64 {
        self.text.len() as u64
    }
}

/// A contiguous span of AI-assistant use inside the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantSession {
    pub start_time: i64,
    pub end_time: i64,
    /// Prompts sent during the session, always at least 1.
    pub prompt_count: u32,
    /// Keystroke bytes typed while the session was open.
    pub input_chars: u64,
    /// Output bytes received while the session was open.
    pub output_chars: u64,
}

impl AssistantSession {
    /// Session length in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).max(0)
    }
}

/// Aggregate behavior derived from one telemetry stream.
///
/// Ratios are clamped to `[0, 1]`. `avg_prompt_length` is a byte count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralMetrics {
    pub total_input_chars: u64,
    pub total_output_chars: u64,
    /// Time between the first and last event.
    pub total_duration_ms: i64,
    /// Non-assistant commands entered at the shell.
    pub shell_command_count: u32,
    pub sessions: Vec<AssistantSession>,
    /// Share of the stream spent inside assistant sessions.
    pub time_in_assistant_ratio: f64,
    /// Share of output bytes produced inside assistant sessions.
    pub assistant_output_ratio: f64,
    /// Share of keystrokes typed outside assistant sessions.
    pub manual_activity_ratio: f64,
    /// Mean bytes typed per assistant prompt.
    ///
    /// A byte count, not a ratio: non-negative and not clamped to `[0, 1]`.
    /// Zero when no session recorded a prompt.
    pub avg_prompt_length: f64,
    /// Prompts per session relative to the saturation target.
    pub iteration_score: f64,
    /// Raw log entries dropped because they could not be decoded.
    #[serde(default)]
    pub skipped_entries: usize,
}

impl BehavioralMetrics {
    /// Metrics for a stream with no events.
    ///
    /// No typing is treated as fully manual work, so the manual ratio is 1.
    pub fn empty() -> Self {
        Self {
            total_input_chars: 0,
            total_output_chars: 0,
            total_duration_ms: 0,
            shell_command_count: 0,
            sessions: Vec::new(),
            time_in_assistant_ratio: 0.0,
            assistant_output_ratio: 0.0,
            manual_activity_ratio: 1.0,
            avg_prompt_length: 0.0,
            iteration_score: 0.0,
            skipped_entries: 0,
        }
    }

    /// Prompts across all sessions.
    pub fn total_prompts(&self) -> u32 {
        self.sessions.iter().map(|s| s.prompt_count).sum()
    }

    /// Keystroke bytes typed inside sessions.
    pub fn assistant_input_chars(&self) -> u64 {
        self.sessions.iter().map(|s| s.input_chars).sum()
    }

    /// Output bytes received inside sessions.
    pub fn assistant_output_chars(&self) -> u64 {
        self.sessions.iter().map(|s| s.output_chars).sum()
    }

    /// Time spent inside sessions.
    pub fn assistant_duration_ms(&self) -> i64 {
        self.sessions.iter().map(AssistantSession::duration_ms).sum()
    }
}

impl Default for BehavioralMetrics {
    fn default() -> Self {
        Self::empty()
    }
}
