//! Shell / assistant-active state machine.
//!
//! ```text
//!            invocation line                      prompt seen AND
//!   ┌───────┐ ─────────────────► ┌──────────────────┐  debounce exceeded
//!   │ Shell │                    │ AssistantActive  │ ────────────────────┐
//!   └───────┘ ◄───────────────── └──────────────────┘                     │
//!       ▲          SessionClosed     │  ▲  lines → prompts                │
//!       │                            └──┘  output → byte counters         │
//!       └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`transition`] is pure: it consumes the current state and one [`Step`] and
//! returns the next state plus the [`Effect`]s the caller should record.
//! End-of-stream is handled by [`finish`].

use regex::Regex;

use crate::config::TelemetryConfig;
use crate::error::{AssayError, Result};

use super::types::AssistantSession;

/// Counters for a session that has not closed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSession {
    pub start_time: i64,
    pub prompt_count: u32,
    pub input_chars: u64,
    pub output_chars: u64,
    /// Output bytes since the session opened; gates prompt detection.
    pub output_since_prompt: u64,
}

impl OpenSession {
    fn open(at: i64, prompt_count: u32) -> Self {
        Self {
            start_time: at,
            prompt_count,
            input_chars: 0,
            output_chars: 0,
            output_since_prompt: 0,
        }
    }

    fn close(self, at: i64) -> AssistantSession {
        AssistantSession {
            start_time: self.start_time,
            end_time: at.max(self.start_time),
            // The invocation itself is the first exchange
            prompt_count: self.prompt_count.max(1),
            input_chars: self.input_chars,
            output_chars: self.output_chars,
        }
    }
}

/// Parser state between steps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParserState {
    /// Plain shell; lines are commands.
    #[default]
    Shell,
    /// An assistant CLI owns the terminal; lines are prompts.
    AssistantActive(OpenSession),
}

impl ParserState {
    /// Whether an assistant session is open.
    pub fn is_assistant_active(&self) -> bool {
        matches!(self, Self::AssistantActive(_))
    }
}

/// One input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    /// Keystroke bytes arrived (before any line they complete is classified).
    InputBytes { bytes: u64 },
    /// A trimmed, non-empty input line was completed.
    LineCompleted { line: &'a str, at: i64 },
    /// Output arrived. `stripped` has escape sequences removed; `raw_len`
    /// is the transmitted length.
    Output {
        raw_len: u64,
        stripped: &'a str,
        at: i64,
    },
}

/// Something the caller should record after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SessionOpened { at: i64 },
    PromptRecorded,
    ShellCommand,
    SessionClosed(AssistantSession),
}

/// Compiled classification rules.
#[derive(Debug, Clone)]
pub struct TransitionRules {
    assistant_tokens: Vec<String>,
    prompt: Regex,
    debounce_bytes: u64,
}

impl TransitionRules {
    /// Compile rules from configuration.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        let prompt = Regex::new(&config.prompt_pattern).map_err(|e| {
            AssayError::Config(format!(
                "invalid prompt pattern {:?}: {e}",
                config.prompt_pattern
            ))
        })?;

        Ok(Self {
            assistant_tokens: config
                .assistant_tokens
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            prompt,
            debounce_bytes: config.prompt_debounce_bytes as u64,
        })
    }

    /// Classify a trimmed line as an assistant invocation.
    ///
    /// Returns `Some(true)` when the invocation carries an inline prompt
    /// (`claude "fix the test"`), `Some(false)` for a bare invocation.
    pub fn invocation(&self, line: &str) -> Option<bool> {
        self.assistant_tokens.iter().find_map(|token| {
            let rest = line.strip_prefix(token.as_str())?;
            if rest.is_empty() {
                Some(false)
            } else if rest.starts_with(char::is_whitespace) {
                Some(!rest.trim().is_empty())
            } else {
                None
            }
        })
    }

    /// Whether the last line of stripped output is shaped like a shell prompt.
    pub fn is_shell_prompt(&self, stripped: &str) -> bool {
        let last_line = stripped.rsplit(['\n', '\r']).next().unwrap_or(stripped);
        self.prompt.is_match(last_line)
    }
}

/// Advance the state machine by one step.
pub fn transition(
    state: ParserState,
    step: Step<'_>,
    rules: &TransitionRules,
) -> (ParserState, Vec<Effect>) {
    match (state, step) {
        (ParserState::Shell, Step::LineCompleted { line, at }) => match rules.invocation(line) {
            Some(inline_prompt) => (
                ParserState::AssistantActive(OpenSession::open(at, u32::from(inline_prompt))),
                vec![Effect::SessionOpened { at }],
            ),
            None => (ParserState::Shell, vec![Effect::ShellCommand]),
        },

        (ParserState::Shell, _) => (ParserState::Shell, Vec::new()),

        (ParserState::AssistantActive(mut session), Step::InputBytes { bytes }) => {
            session.input_chars += bytes;
            (ParserState::AssistantActive(session), Vec::new())
        }

        (ParserState::AssistantActive(mut session), Step::LineCompleted { .. }) => {
            session.prompt_count += 1;
            (
                ParserState::AssistantActive(session),
                vec![Effect::PromptRecorded],
            )
        }

        (
            ParserState::AssistantActive(mut session),
            Step::Output {
                raw_len,
                stripped,
                at,
            },
        ) => {
            session.output_chars += raw_len;
            session.output_since_prompt += raw_len;

            if session.output_since_prompt > rules.debounce_bytes && rules.is_shell_prompt(stripped)
            {
                (
                    ParserState::Shell,
                    vec![Effect::SessionClosed(session.close(at))],
                )
            } else {
                (ParserState::AssistantActive(session), Vec::new())
            }
        }
    }
}

/// Close whatever is still open at end-of-stream.
pub fn finish(state: ParserState, last_at: i64) -> Option<AssistantSession> {
    match state {
        ParserState::Shell => None,
        ParserState::AssistantActive(session) => Some(session.close(last_at)),
    }
}
