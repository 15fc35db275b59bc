//! Storage interfaces used by the profile aggregator.
//!
//! The aggregator reads session artifacts through [`ArtifactSource`] and writes
//! the finished profile through [`ProfileStore`]. Both are injected, so the
//! aggregator never talks to a database directly.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::adaptive::ExerciseResult;
use crate::error::{AssayError, Result};
use crate::scoring::InteractionEvent;
use crate::types::CandidateId;

use super::types::{CandidateArtifacts, CandidateProfile, QuickfireResponse, ReviewArtifacts};

/// Read access to everything a candidate produced during a session.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn exercise_results(&self, candidate: &CandidateId) -> Result<Vec<ExerciseResult>>;

    async fn interactions(&self, candidate: &CandidateId) -> Result<Vec<InteractionEvent>>;

    async fn review(&self, candidate: &CandidateId) -> Result<ReviewArtifacts>;

    async fn quickfire(&self, candidate: &CandidateId) -> Result<Vec<QuickfireResponse>>;
}

/// Persistence for candidate profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert or overwrite the profile keyed by its candidate id.
    async fn upsert(&self, profile: &CandidateProfile) -> Result<()>;

    async fn get(&self, candidate: &CandidateId) -> Result<Option<CandidateProfile>>;
}

/// In-memory artifact source (for testing).
#[derive(Debug, Default)]
pub struct InMemoryArtifactSource {
    artifacts: RwLock<HashMap<CandidateId, CandidateArtifacts>>,
}

impl InMemoryArtifactSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the artifacts stored for `candidate`.
    pub async fn insert(&self, candidate: impl Into<CandidateId>, artifacts: CandidateArtifacts) {
        self.artifacts.write().await.insert(candidate.into(), artifacts);
    }

    async fn with<T>(
        &self,
        candidate: &CandidateId,
        f: impl FnOnce(&CandidateArtifacts) -> T + Send,
    ) -> Result<T> {
        let artifacts = self.artifacts.read().await;
        artifacts.get(candidate).map(f).ok_or_else(|| {
            AssayError::Repository(format!("no artifacts for candidate {candidate}"))
        })
    }
}

#[async_trait]
impl ArtifactSource for InMemoryArtifactSource {
    async fn exercise_results(&self, candidate: &CandidateId) -> Result<Vec<ExerciseResult>> {
        self.with(candidate, |a| a.results.clone()).await
    }

    async fn interactions(&self, candidate: &CandidateId) -> Result<Vec<InteractionEvent>> {
        self.with(candidate, |a| a.interactions.clone()).await
    }

    async fn review(&self, candidate: &CandidateId) -> Result<ReviewArtifacts> {
        self.with(candidate, |a| a.review.clone()).await
    }

    async fn quickfire(&self, candidate: &CandidateId) -> Result<Vec<QuickfireResponse>> {
        self.with(candidate, |a| a.quickfire.clone()).await
    }
}

/// In-memory profile store (for testing).
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<CandidateId, CandidateProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored profiles (for testing).
    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn upsert(&self, profile: &CandidateProfile) -> Result<()> {
        self.profiles
            .write()
            .await
            .insert(profile.candidate_id.clone(), profile.clone());
        Ok(())
    }

    async fn get(&self, candidate: &CandidateId) -> Result<Option<CandidateProfile>> {
        Ok(self.profiles.read().await.get(candidate).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::types::{NarrativeStatus, PhaseScore, Recommendation, ReviewComment};

    fn profile(id: &str, overall: f64) -> CandidateProfile {
        CandidateProfile {
            candidate_id: id.into(),
            technical: PhaseScore::no_data(),
            collaboration: PhaseScore::no_data(),
            communication: PhaseScore::no_data(),
            overall,
            narrative: String::new(),
            recommendation: Recommendation::from_overall(overall),
            strengths: vec![],
            concerns: vec![],
            narrative_status: NarrativeStatus::Fallback,
        }
    }

    #[tokio::test]
    async fn test_artifact_source_returns_stored_artifacts() {
        let source = InMemoryArtifactSource::new();
        let artifacts = CandidateArtifacts {
            review: ReviewArtifacts {
                comments: vec![ReviewComment::new(Some(1), "nit")],
                planted_issues: vec![],
            },
            ..Default::default()
        };
        source.insert("cand-1", artifacts).await;

        let id = CandidateId::new("cand-1");
        assert_eq!(source.review(&id).await.unwrap().comments.len(), 1);
        assert!(source.exercise_results(&id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_candidate_is_a_repository_error() {
        let source = InMemoryArtifactSource::new();
        let err = source.quickfire(&CandidateId::new("ghost")).await.unwrap_err();
        assert!(matches!(err, AssayError::Repository(_)));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_candidate() {
        let store = InMemoryProfileStore::new();
        assert!(store.is_empty().await);

        store.upsert(&profile("cand-1", 3.0)).await.unwrap();
        store.upsert(&profile("cand-1", 7.0)).await.unwrap();
        store.upsert(&profile("cand-2", 5.0)).await.unwrap();

        assert_eq!(store.len().await, 2);
        let stored = store.get(&CandidateId::new("cand-1")).await.unwrap().unwrap();
        assert_eq!(stored.overall, 7.0);
        assert_eq!(stored.recommendation, Recommendation::Hire);
        assert!(store.get(&CandidateId::new("nobody")).await.unwrap().is_none());
    }
}
