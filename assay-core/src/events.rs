//! Side-effect emission for the scoring pipeline.
//!
//! Scoring functions never log to external systems themselves. The stateful
//! wrappers ([`AdaptiveEngine`](crate::adaptive::AdaptiveEngine) and
//! [`ProfileAggregator`](crate::profile::ProfileAggregator)) hand a
//! [`ScoringEvent`] to an [`EventSink`] synchronously; what the sink does with
//! it (forward, retry, drop) is the caller's concern.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::profile::{NarrativeStatus, Recommendation};
use crate::types::{CandidateId, ExerciseId, Tier};

/// Something worth recording that happened inside the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoringEvent {
    /// The adaptive engine picked the next exercise.
    ExerciseSelected {
        exercise_id: ExerciseId,
        tier: Tier,
        reason: String,
        flag_high_reliance: bool,
    },
    /// Every exercise in the pool has been attempted.
    PoolExhausted { attempted: usize },
    /// The narrative generator failed or timed out and a fallback was used.
    NarrativeFallback {
        candidate_id: CandidateId,
        error: String,
    },
    /// A candidate profile was written.
    ProfilePersisted {
        candidate_id: CandidateId,
        recommendation: Recommendation,
        narrative_status: NarrativeStatus,
    },
}

/// Receiver for pipeline events.
///
/// `emit` is called inline and must not block; implementations that forward
/// to slow destinations should buffer.
pub trait EventSink: Send + Sync {
    /// Deliver an event.
    fn emit(&self, event: ScoringEvent);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: ScoringEvent) {}
}

/// Sink that keeps every event in memory (for testing).
#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    events: Mutex<Vec<ScoringEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<ScoringEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for InMemoryEventSink {
    fn emit(&self, event: ScoringEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Sink that fans events out over a tokio broadcast channel.
///
/// Events emitted with no live subscriber are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    tx: broadcast::Sender<ScoringEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ScoringEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: ScoringEvent) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}
