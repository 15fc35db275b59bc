//! Decoding of the capture layer's JSONL telemetry log.
//!
//! One record per line:
//!
//! ```text
//! {"timestamp": 1718035200123, "direction": "in", "text": "claude\r"}
//! {"timestamp": "2024-06-10T16:00:00.456Z", "direction": "output", "text": "..."}
//! ```
//!
//! Lines that fail to decode are skipped and counted; decoding never fails.

use chrono::DateTime;
use serde::Deserialize;
use tracing::warn;

use super::types::{Direction, TelemetryEvent};

/// Events recovered from a log plus the number of lines that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedLog {
    pub events: Vec<TelemetryEvent>,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    fn to_millis(&self) -> Option<i64> {
        match self {
            Self::Millis(ms) => Some(*ms),
            Self::Text(text) => match text.trim().parse::<i64>() {
                Ok(ms) => Some(ms),
                Err(_) => DateTime::parse_from_rfc3339(text.trim())
                    .ok()
                    .map(|dt| dt.timestamp_millis()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(alias = "timestamp_ms", alias = "ts")]
    timestamp: RawTimestamp,
    direction: Direction,
    #[serde(default, alias = "data")]
    text: String,
}

/// Decode a JSONL telemetry log, skipping malformed lines.
pub fn decode_event_log(content: &str) -> DecodedLog {
    let mut decoded = DecodedLog::default();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = serde_json::from_str::<RawRecord>(line)
            .map_err(|e| e.to_string())
            .and_then(|raw| match raw.timestamp.to_millis() {
                Some(timestamp_ms) => Ok(TelemetryEvent {
                    timestamp_ms,
                    direction: raw.direction,
                    text: raw.text,
                }),
                None => Err("unparseable timestamp".to_string()),
            });

        match event {
            Ok(event) => decoded.events.push(event),
            Err(error) => {
                warn!(line = idx + 1, %error, "skipping malformed telemetry entry");
                decoded.skipped += 1;
            }
        }
    }

    decoded
}
