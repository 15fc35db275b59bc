//! assay-core - Behavioral scoring for timed coding assessments
//!
//! This crate turns terminal telemetry, test outcomes and static code
//! heuristics into calibrated scores, picks the next exercise for a candidate,
//! and folds a finished session into a persisted candidate profile.
//!
//! # Module Organization
//!
//! - **[`telemetry`]** - terminal I/O parsing into assistant sessions and
//!   behavioral metrics
//! - **[`scoring`]** - weighted signal blending, code-quality and AI-reliance scores
//! - **[`adaptive`]** - tier transition rules and novelty-first exercise selection
//! - **[`profile`]** - per-phase sub-scorers, narrative generation and the
//!   profile aggregator
//!
//! Everything except [`profile::ProfileAggregator`] is synchronous and pure.

pub mod adaptive;
pub mod config;
pub mod error;
pub mod events;
pub mod profile;
pub mod scoring;
pub mod telemetry;
pub mod types;

pub use config::{
    AdaptiveConfig, AssayConfig, NarrativeConfig, ProfileConfig, QualityConfig, TelemetryConfig,
};
pub use error::{AssayError, Result};
pub use events::{
    BroadcastEventSink, EventSink, InMemoryEventSink, NoOpEventSink, ScoringEvent,
};
pub use types::{CandidateId, ExerciseId, Tier};

// Telemetry re-exports
pub use telemetry::{
    AssistantSession, BehavioralMetrics, DecodedLog, Direction, TelemetryEvent, TelemetryParser,
    decode_event_log, parse_log,
};

// Scoring re-exports
pub use scoring::{
    Acceptance, BlendPolicy, InteractionEvent, QualityScorer, TestRunResult, score_quality,
    score_reliance,
};

// Adaptive re-exports
pub use adaptive::{
    AdaptiveEngine, ExerciseResult, ExerciseSummary, NextExercise, Selection, SelectionReason,
    record_result, select_next,
};

// Profile re-exports
pub use profile::{
    AggregationOutcome, ArtifactSource, CandidateArtifacts, CandidateProfile,
    CommandNarrativeGenerator, InMemoryArtifactSource, InMemoryProfileStore, NarrativeError,
    NarrativeGenerator, NarrativePayload, NarrativeStatus, NarrativeVerdict,
    NoOpNarrativeGenerator, PhaseScore, PlantedIssue, ProfileAggregator, ProfileStore,
    QuickfireResponse, Recommendation, ReviewArtifacts, ReviewComment,
};
