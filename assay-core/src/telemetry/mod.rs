//! Terminal telemetry parsing.
//!
//! Raw terminal I/O (keystrokes in, terminal output out) is folded into
//! AI-assistant sessions and a [`BehavioralMetrics`] summary.
//!
//! ```text
//! JSONL log ──decode_event_log──► Vec<TelemetryEvent>
//!                                        │
//!                                        ▼
//!                    TelemetryParser::parse (sort, line assembly)
//!                                        │
//!                         machine::transition per step
//!                                        │
//!                                        ▼
//!                               BehavioralMetrics
//! ```
//!
//! - **[`types`]** - event, session and metrics records
//! - **[`ansi`]** - escape-sequence stripping for prompt matching
//! - **[`machine`]** - the shell / assistant-active state machine
//! - **[`parser`]** - event ordering, line assembly and ratio derivation
//! - **[`log`]** - tolerant decoding of the capture layer's JSONL log

pub mod ansi;
pub mod log;
pub mod machine;
pub mod parser;
pub mod types;

pub use ansi::strip_ansi;
pub use log::{DecodedLog, decode_event_log};
pub use machine::{Effect, OpenSession, ParserState, Step, TransitionRules, finish, transition};
pub use parser::{TelemetryParser, parse_log};
pub use types::{AssistantSession, BehavioralMetrics, Direction, TelemetryEvent};
