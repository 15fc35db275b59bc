//! Adaptive exercise selection.
//!
//! The only persisted state is the ordered [`ExerciseResult`] history. Each
//! transition is one read-modify-write: [`record_result`] appends the latest
//! result, [`select_next`] decides the next exercise from the history.
//!
//! ```text
//! history ──rules::decide_tier──► target tier ──selection::pick──► Selection
//!                                                     ▲
//!                                            pool minus attempted
//! ```

pub mod engine;
pub mod rules;
pub mod selection;
pub mod types;

pub use engine::{AdaptiveEngine, record_result, select_next};
pub use rules::{TierDecision, decide_tier};
pub use selection::pick_exercise;
pub use types::{ExerciseResult, ExerciseSummary, NextExercise, Selection, SelectionReason};
