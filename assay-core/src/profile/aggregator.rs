//! Folds a finished session into a persisted [`CandidateProfile`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::config::ProfileConfig;
use crate::error::Result;
use crate::events::{EventSink, NoOpEventSink, ScoringEvent};
use crate::types::CandidateId;

use super::collaboration::score_collaboration;
use super::communication::score_communication;
use super::narrative::{NarrativeError, NarrativeGenerator, NarrativePayload, NarrativeVerdict};
use super::repository::{ArtifactSource, ProfileStore};
use super::technical::score_technical;
use super::types::{
    CandidateArtifacts, CandidateProfile, NarrativeStatus, Recommendation, overall_score,
};

/// A persisted profile plus the narrative failure, if the fallback was used.
#[derive(Debug)]
pub struct AggregationOutcome {
    pub profile: CandidateProfile,
    /// Set when the narrative generator failed or timed out. The profile was
    /// still persisted; callers may retry or alert.
    pub narrative_error: Option<NarrativeError>,
}

impl AggregationOutcome {
    /// Whether the narrative came from the score-derived fallback.
    pub fn is_fallback(&self) -> bool {
        self.narrative_error.is_some()
    }
}

/// Score the three phases and build the narrative payload. Pure.
pub fn build_payload(
    candidate_id: &CandidateId,
    artifacts: &CandidateArtifacts,
    config: &ProfileConfig,
) -> NarrativePayload {
    let technical = score_technical(
        &artifacts.results,
        &artifacts.quickfire,
        &artifacts.review,
        config.review_line_tolerance,
    );
    let collaboration = score_collaboration(
        &artifacts.interactions,
        &artifacts.results,
        config.prompt_min_chars,
    );
    let communication = score_communication(&artifacts.review.comments);
    let overall = overall_score(&technical, &collaboration, &communication);

    NarrativePayload {
        candidate_id: candidate_id.clone(),
        technical,
        collaboration,
        communication,
        overall,
        exercises_attempted: artifacts.results.len(),
        exercises_completed: artifacts.results.iter().filter(|r| r.completed).count(),
        review_comments: artifacts.review.comments.iter().map(|c| c.body.clone()).collect(),
    }
}

/// Combine scores and the narrative verdict. Without a verdict the narrative
/// is empty and the recommendation comes from the overall score.
pub fn assemble_profile(
    payload: NarrativePayload,
    verdict: Option<NarrativeVerdict>,
) -> CandidateProfile {
    let derived = Recommendation::from_overall(payload.overall);
    let (narrative, recommendation, strengths, concerns, narrative_status) = match verdict {
        Some(v) => (
            v.narrative,
            v.recommendation.unwrap_or(derived),
            v.strengths,
            v.concerns,
            NarrativeStatus::Generated,
        ),
        None => (
            String::new(),
            derived,
            Vec::new(),
            Vec::new(),
            NarrativeStatus::Fallback,
        ),
    };

    CandidateProfile {
        candidate_id: payload.candidate_id,
        technical: payload.technical,
        collaboration: payload.collaboration,
        communication: payload.communication,
        overall: payload.overall,
        narrative,
        recommendation,
        strengths,
        concerns,
        narrative_status,
    }
}

/// Fetches artifacts, scores them, asks for a narrative and persists the
/// profile. The only writer of candidate profiles.
pub struct ProfileAggregator {
    source: Arc<dyn ArtifactSource>,
    store: Arc<dyn ProfileStore>,
    narrator: Arc<dyn NarrativeGenerator>,
    sink: Arc<dyn EventSink>,
    config: ProfileConfig,
}

impl ProfileAggregator {
    pub fn new(
        source: Arc<dyn ArtifactSource>,
        store: Arc<dyn ProfileStore>,
        narrator: Arc<dyn NarrativeGenerator>,
        config: ProfileConfig,
    ) -> Self {
        Self {
            source,
            store,
            narrator,
            sink: Arc::new(NoOpEventSink),
            config,
        }
    }

    /// Send aggregation events to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Ceiling on the narrative call, retries included.
    pub fn narrative_timeout(&self) -> Duration {
        Duration::from_secs(self.config.narrative_timeout_seconds)
    }

    async fn fetch(&self, candidate_id: &CandidateId) -> Result<CandidateArtifacts> {
        let (results, interactions, review, quickfire) = tokio::try_join!(
            self.source.exercise_results(candidate_id),
            self.source.interactions(candidate_id),
            self.source.review(candidate_id),
            self.source.quickfire(candidate_id),
        )?;

        Ok(CandidateArtifacts {
            results,
            interactions,
            review,
            quickfire,
        })
    }

    async fn narrate(
        &self,
        payload: &NarrativePayload,
    ) -> std::result::Result<NarrativeVerdict, NarrativeError> {
        let generation = self.narrator.generate(payload);
        match tokio::time::timeout(self.narrative_timeout(), generation).await {
            Ok(result) => result,
            Err(_) => Err(NarrativeError::Timeout(self.config.narrative_timeout_seconds)),
        }
    }

    /// Build and persist the profile for `candidate_id`.
    ///
    /// A fetch or store failure is an error and nothing is persisted. A
    /// narrative failure is not: the numeric profile is persisted with the
    /// fallback narrative and the failure is returned in the outcome.
    /// Re-running with unchanged artifacts overwrites the same record.
    #[instrument(name = "profile::aggregate", skip_all, fields(candidate_id = %candidate_id))]
    pub async fn aggregate(&self, candidate_id: &CandidateId) -> Result<AggregationOutcome> {
        let artifacts = self.fetch(candidate_id).await?;
        let payload = build_payload(candidate_id, &artifacts, &self.config);
        debug!(
            technical = payload.technical.score,
            collaboration = payload.collaboration.score,
            communication = payload.communication.score,
            overall = payload.overall,
            "phase scores"
        );

        let (profile, narrative_error) = match self.narrate(&payload).await {
            Ok(verdict) => (assemble_profile(payload, Some(verdict)), None),
            Err(error) => {
                warn!(%error, "narrative unavailable, using score-derived recommendation");
                self.sink.emit(ScoringEvent::NarrativeFallback {
                    candidate_id: candidate_id.clone(),
                    error: error.to_string(),
                });
                (assemble_profile(payload, None), Some(error))
            }
        };

        self.store.upsert(&profile).await?;
        info!(
            overall = profile.overall,
            recommendation = %profile.recommendation,
            narrative_status = ?profile.narrative_status,
            "profile persisted"
        );
        self.sink.emit(ScoringEvent::ProfilePersisted {
            candidate_id: candidate_id.clone(),
            recommendation: profile.recommendation,
            narrative_status: profile.narrative_status,
        });

        Ok(AggregationOutcome {
            profile,
            narrative_error,
        })
    }
}

impl std::fmt::Debug for ProfileAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileAggregator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;

    use super::*;
    use crate::adaptive::ExerciseResult;
    use crate::error::AssayError;
    use crate::events::InMemoryEventSink;
    use crate::profile::repository::{InMemoryArtifactSource, InMemoryProfileStore};
    use crate::profile::types::{QuickfireResponse, ReviewArtifacts, ReviewComment};
    use crate::profile::NoOpNarrativeGenerator;
    use crate::scoring::InteractionEvent;
    use crate::types::Tier;

    struct FixedNarrative(NarrativeVerdict);

    #[async_trait]
    impl NarrativeGenerator for FixedNarrative {
        async fn generate(
            &self,
            _payload: &NarrativePayload,
        ) -> std::result::Result<NarrativeVerdict, NarrativeError> {
            Ok(self.0.clone())
        }
    }

    struct StalledNarrative;

    #[async_trait]
    impl NarrativeGenerator for StalledNarrative {
        async fn generate(
            &self,
            _payload: &NarrativePayload,
        ) -> std::result::Result<NarrativeVerdict, NarrativeError> {
            tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
            Err(NarrativeError::Disabled)
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl ArtifactSource for BrokenSource {
        async fn exercise_results(&self, _c: &CandidateId) -> Result<Vec<ExerciseResult>> {
            Ok(vec![])
        }
        async fn interactions(&self, _c: &CandidateId) -> Result<Vec<InteractionEvent>> {
            Err(AssayError::Repository("event store offline".into()))
        }
        async fn review(&self, _c: &CandidateId) -> Result<ReviewArtifacts> {
            Ok(ReviewArtifacts::default())
        }
        async fn quickfire(&self, _c: &CandidateId) -> Result<Vec<QuickfireResponse>> {
            Ok(vec![])
        }
    }

    fn artifacts() -> CandidateArtifacts {
        CandidateArtifacts {
            results: vec![ExerciseResult {
                exercise_id: "ex-1".into(),
                tier: Tier::MIN,
                completed: true,
                time_used_ms: 30_000,
                time_limit_ms: 60_000,
                quality_score: 1.0,
                reliance_ratio: 0.0,
                topics: BTreeSet::new(),
            }],
            interactions: vec![],
            review: ReviewArtifacts::default(),
            quickfire: vec![QuickfireResponse {
                question_id: "q1".into(),
                answer: "O(n)".into(),
                correct: true,
            }],
        }
    }

    async fn seeded_source() -> Arc<InMemoryArtifactSource> {
        let source = Arc::new(InMemoryArtifactSource::new());
        source.insert("cand-1", artifacts()).await;
        source
    }

    #[test]
    fn test_payload_counts_exercises_and_comments() {
        let mut artifacts = artifacts();
        let comment = "Consider `Vec::with_capacity`.";
        artifacts.review.comments.push(ReviewComment::new(Some(2), comment));
        let payload = build_payload(&"c".into(), &artifacts, &ProfileConfig::default());
        assert_eq!(payload.exercises_attempted, 1);
        assert_eq!(payload.exercises_completed, 1);
        assert_eq!(payload.review_comments, vec![comment.to_string()]);
        assert_eq!(payload.technical.score, 10.0);
    }

    #[test]
    fn test_verdict_recommendation_wins_over_derived() {
        let payload = build_payload(&"c".into(), &artifacts(), &ProfileConfig::default());
        let verdict = NarrativeVerdict {
            narrative: "Careful and quick.".into(),
            recommendation: Some(Recommendation::StrongHire),
            strengths: vec!["testing".into()],
            concerns: vec![],
        };
        let profile = assemble_profile(payload.clone(), Some(verdict));
        assert_eq!(profile.recommendation, Recommendation::StrongHire);
        assert_eq!(profile.narrative_status, NarrativeStatus::Generated);

        let fallback = assemble_profile(payload.clone(), None);
        assert_eq!(fallback.recommendation, Recommendation::from_overall(payload.overall));
        assert!(fallback.narrative.is_empty());
        assert_eq!(fallback.narrative_status, NarrativeStatus::Fallback);
    }

    #[tokio::test]
    async fn test_generated_narrative_is_persisted() {
        let store = Arc::new(InMemoryProfileStore::new());
        let sink = Arc::new(InMemoryEventSink::new());
        let narrator = Arc::new(FixedNarrative(NarrativeVerdict {
            narrative: "Strong fundamentals.".into(),
            recommendation: None,
            strengths: vec!["accuracy".into()],
            concerns: vec![],
        }));
        let aggregator = ProfileAggregator::new(
            seeded_source().await,
            store.clone(),
            narrator,
            ProfileConfig::default(),
        )
        .with_sink(sink.clone());

        let outcome = aggregator.aggregate(&"cand-1".into()).await.unwrap();
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.profile.narrative, "Strong fundamentals.");
        assert_eq!(outcome.profile.strengths, vec!["accuracy".to_string()]);

        let stored = store.get(&"cand-1".into()).await.unwrap().unwrap();
        assert_eq!(stored, outcome.profile);
        assert!(matches!(
            sink.events().last(),
            Some(ScoringEvent::ProfilePersisted {
                narrative_status: NarrativeStatus::Generated,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_disabled_narrative_falls_back_and_persists() {
        let store = Arc::new(InMemoryProfileStore::new());
        let sink = Arc::new(InMemoryEventSink::new());
        let aggregator = ProfileAggregator::new(
            seeded_source().await,
            store.clone(),
            Arc::new(NoOpNarrativeGenerator),
            ProfileConfig::default(),
        )
        .with_sink(sink.clone());

        let outcome = aggregator.aggregate(&"cand-1".into()).await.unwrap();
        assert!(matches!(outcome.narrative_error, Some(NarrativeError::Disabled)));
        assert_eq!(outcome.profile.narrative_status, NarrativeStatus::Fallback);
        assert_eq!(store.len().await, 1);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ScoringEvent::NarrativeFallback { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_narrative_times_out_into_fallback() {
        let store = Arc::new(InMemoryProfileStore::new());
        let aggregator = ProfileAggregator::new(
            seeded_source().await,
            store.clone(),
            Arc::new(StalledNarrative),
            ProfileConfig::default(),
        );

        let outcome = aggregator.aggregate(&"cand-1".into()).await.unwrap();
        assert!(matches!(outcome.narrative_error, Some(NarrativeError::Timeout(90))));
        assert!(store.get(&"cand-1".into()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_aggregation_is_idempotent() {
        let store = Arc::new(InMemoryProfileStore::new());
        let aggregator = ProfileAggregator::new(
            seeded_source().await,
            store.clone(),
            Arc::new(NoOpNarrativeGenerator),
            ProfileConfig::default(),
        );

        let first = aggregator.aggregate(&"cand-1".into()).await.unwrap().profile;
        let second = aggregator.aggregate(&"cand-1".into()).await.unwrap().profile;
        assert_eq!(first, second);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&"cand-1".into()).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_fetch_failure_persists_nothing() {
        let store = Arc::new(InMemoryProfileStore::new());
        let aggregator = ProfileAggregator::new(
            Arc::new(BrokenSource),
            store.clone(),
            Arc::new(NoOpNarrativeGenerator),
            ProfileConfig::default(),
        );

        let err = aggregator.aggregate(&"cand-1".into()).await.unwrap_err();
        assert!(matches!(err, AssayError::Repository(_)));
        assert!(store.is_empty().await);
    }
}
