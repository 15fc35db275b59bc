//! Event ordering, line assembly and metric derivation.

use tracing::{debug, trace};

use crate::config::TelemetryConfig;
use crate::error::Result;

use super::ansi::strip_ansi;
use super::log::decode_event_log;
use super::machine::{Effect, ParserState, Step, TransitionRules, finish, transition};
use super::types::{AssistantSession, BehavioralMetrics, Direction, TelemetryEvent};

/// Folds a telemetry stream into [`BehavioralMetrics`].
///
/// The parser holds only compiled rules, so one instance can be shared
/// across candidates. Re-parsing a log that has grown since the last call
/// is always correct; the whole log is replayed each time.
#[derive(Debug, Clone)]
pub struct TelemetryParser {
    rules: TransitionRules,
    target_prompts_per_session: f64,
}

/// Mutable bookkeeping for one parse.
#[derive(Debug, Default)]
struct Tally {
    sessions: Vec<AssistantSession>,
    shell_commands: u32,
    total_input: u64,
    total_output: u64,
}

impl Tally {
    fn record(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            trace!(?effect, "telemetry transition");
            match effect {
                Effect::SessionClosed(session) => self.sessions.push(session),
                Effect::ShellCommand => self.shell_commands += 1,
                Effect::SessionOpened { .. } | Effect::PromptRecorded => {}
            }
        }
    }
}

impl TelemetryParser {
    /// Build a parser from configuration.
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        Ok(Self {
            rules: TransitionRules::from_config(config)?,
            target_prompts_per_session: config.target_prompts_per_session,
        })
    }

    /// Parse events into metrics. Events need not be pre-sorted.
    pub fn parse(&self, events: &[TelemetryEvent]) -> BehavioralMetrics {
        if events.is_empty() {
            return BehavioralMetrics::empty();
        }

        let mut ordered: Vec<&TelemetryEvent> = events.iter().collect();
        ordered.sort_by_key(|e| e.timestamp_ms);

        let mut state = ParserState::Shell;
        let mut tally = Tally::default();
        let mut line = String::new();

        for event in &ordered {
            let at = event.timestamp_ms;
            match event.direction {
                Direction::In => {
                    tally.total_input += event.byte_len();
                    for ch in event.text.chars() {
                        let bytes = ch.len_utf8() as u64;
                        state = self.step(state, Step::InputBytes { bytes }, &mut tally);

                        match ch {
                            '\r' | '\n' => {
                                let completed = line.trim().to_string();
                                line.clear();
                                if !completed.is_empty() {
                                    let step = Step::LineCompleted {
                                        line: &completed,
                                        at,
                                    };
                                    state = self.step(state, step, &mut tally);
                                }
                            }
                            '\x08' | '\x7f' => {
                                line.pop();
                            }
                            c if c.is_control() => {}
                            c => line.push(c),
                        }
                    }
                }
                Direction::Out => {
                    tally.total_output += event.byte_len();
                    let stripped = strip_ansi(&event.text);
                    let step = Step::Output {
                        raw_len: event.byte_len(),
                        stripped: &stripped,
                        at,
                    };
                    state = self.step(state, step, &mut tally);
                }
            }
        }

        let first_at = ordered.first().map_or(0, |e| e.timestamp_ms);
        let last_at = ordered.last().map_or(0, |e| e.timestamp_ms);
        if let Some(session) = finish(state, last_at) {
            tally.sessions.push(session);
        }

        let metrics = self.derive(tally, last_at - first_at);
        debug!(
            events = events.len(),
            sessions = metrics.sessions.len(),
            shell_commands = metrics.shell_command_count,
            time_in_assistant = metrics.time_in_assistant_ratio,
            "parsed telemetry"
        );
        metrics
    }

    /// Decode a JSONL capture log and parse it, recording skipped lines.
    pub fn parse_log(&self, content: &str) -> BehavioralMetrics {
        let decoded = decode_event_log(content);
        let mut metrics = self.parse(&decoded.events);
        metrics.skipped_entries = decoded.skipped;
        metrics
    }

    fn step(&self, state: ParserState, step: Step<'_>, tally: &mut Tally) -> ParserState {
        let (next, effects) = transition(state, step, &self.rules);
        tally.record(effects);
        next
    }

    fn derive(&self, tally: Tally, total_duration_ms: i64) -> BehavioralMetrics {
        let mut metrics = BehavioralMetrics {
            total_input_chars: tally.total_input,
            total_output_chars: tally.total_output,
            total_duration_ms,
            shell_command_count: tally.shell_commands,
            sessions: tally.sessions,
            ..BehavioralMetrics::empty()
        };

        let assistant_input = metrics.assistant_input_chars();
        let prompts = metrics.total_prompts();

        metrics.time_in_assistant_ratio = ratio(
            metrics.assistant_duration_ms() as f64,
            total_duration_ms as f64,
        );
        metrics.assistant_output_ratio = ratio(
            metrics.assistant_output_chars() as f64,
            tally.total_output as f64,
        );
        metrics.manual_activity_ratio = if tally.total_input == 0 {
            1.0
        } else {
            ratio(
                tally.total_input.saturating_sub(assistant_input) as f64,
                tally.total_input as f64,
            )
        };
        metrics.avg_prompt_length = if prompts == 0 {
            0.0
        } else {
            assistant_input as f64 / f64::from(prompts)
        };
        metrics.iteration_score = if metrics.sessions.is_empty() {
            0.0
        } else {
            let per_session = f64::from(prompts) / metrics.sessions.len() as f64;
            ratio(per_session, self.target_prompts_per_session)
        };

        metrics
    }
}

/// `numerator / denominator` clamped to `[0, 1]`, zero when undefined.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (numerator / denominator).clamp(0.0, 1.0)
}

/// Decode and parse a JSONL capture log with the given settings.
pub fn parse_log(content: &str, config: &TelemetryConfig) -> Result<BehavioralMetrics> {
    Ok(TelemetryParser::new(config)?.parse_log(content))
}
