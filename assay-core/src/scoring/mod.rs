//! Signal fusion into code-quality and AI-reliance scores.
//!
//! Both scorers reduce to the same shape: a handful of named signals, some
//! of which may be missing, combined under a blend policy that depends on
//! which signals are present. The policies live in [`signal`] as data.

pub mod quality;
pub mod reliance;
pub mod signal;

pub use quality::{QualityBreakdown, QualityScorer, TestRunResult, score_quality};
pub use reliance::{
    Acceptance, InteractionEvent, RelianceBreakdown, event_estimate, reliance_breakdown,
    score_reliance, terminal_estimate,
};
pub use signal::{BlendPolicy, BlendRule, Signal, normalized_sum, weighted_sum};
