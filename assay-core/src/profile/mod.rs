//! Candidate profile: per-phase sub-scorers, narrative generation and the
//! aggregator that persists the result.
//!
//! ```text
//! ArtifactSource ──try_join──▶ technical / collaboration / communication
//!                                        │
//!                                        ▼
//!                              NarrativeGenerator (timeout, fallback)
//!                                        │
//!                                        ▼
//!                              ProfileStore::upsert
//! ```

pub mod aggregator;
pub mod collaboration;
pub mod communication;
pub mod narrative;
pub mod repository;
pub mod technical;
pub mod types;

pub use aggregator::{AggregationOutcome, ProfileAggregator, assemble_profile, build_payload};
pub use collaboration::{
    independence_score, prompt_quality, prompt_quality_score, score_collaboration,
    verification_score,
};
pub use communication::{clarity, constructiveness, score_communication, specificity};
pub use narrative::{
    CommandNarrativeGenerator, NarrativeError, NarrativeGenerator, NarrativePayload,
    NarrativeVerdict, NoOpNarrativeGenerator,
};
pub use repository::{ArtifactSource, InMemoryArtifactSource, InMemoryProfileStore, ProfileStore};
pub use technical::{completion_score, detection_ratio, quickfire_accuracy, score_technical};
pub use types::{
    CandidateArtifacts, CandidateProfile, MAX_PHASE_SCORE, MIN_PHASE_SCORE, NarrativeStatus,
    PhaseScore, PlantedIssue, QuickfireResponse, Recommendation, ReviewArtifacts, ReviewComment,
    overall_score,
};
