use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::metrics::{
    CANDIDATES_SCORED_TOTAL, MATCH_RUNS_TOTAL, PERSISTED_TOTAL, SCORING_FAILURES_TOTAL,
    SCORING_SECONDS,
};
use super::prefilter::MentorPreFilter;
use super::ranking::{RankingConfig, ScoredCandidate, rank_scored};
use crate::api::match_response::MentorMatch;
use crate::db::{MatchStore, StoreError};
use crate::scoring::{FitScorer, ScoringError};
use crate::{Idea, MentorProfile};

pub const DEFAULT_SCORING_CONCURRENCY: usize = 1;
pub const DEFAULT_SCORING_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    pub ranking: RankingConfig,
    /// Scoring calls in flight at once. 1 scores candidates one after another.
    pub scoring_concurrency: usize,
    pub scoring_timeout: Duration,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            ranking: RankingConfig::default(),
            scoring_concurrency: DEFAULT_SCORING_CONCURRENCY,
            scoring_timeout: DEFAULT_SCORING_TIMEOUT,
        }
    }
}

impl MatchingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let score_threshold = lookup("MM_SCORE_THRESHOLD")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(defaults.ranking.score_threshold);
        let top_k = lookup("MM_TOP_K")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.ranking.top_k);
        let scoring_concurrency = lookup("MM_SCORING_CONCURRENCY")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.scoring_concurrency);
        let scoring_timeout = lookup("MM_SCORING_TIMEOUT_SECONDS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|value| *value > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.scoring_timeout);

        Self {
            ranking: RankingConfig {
                score_threshold,
                top_k,
            },
            scoring_concurrency,
            scoring_timeout,
        }
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("idea {0} not found")]
    IdeaNotFound(Uuid),
    #[error("failed to load idea: {0}")]
    IdeaLookup(#[source] StoreError),
    #[error("failed to load mentor candidates: {0}")]
    CandidateLookup(#[source] StoreError),
    #[error("failed to persist mentor matches: {0}")]
    Persistence(#[source] StoreError),
}

/// Outcome of a ranking run before anything is written.
#[derive(Debug, Clone, Serialize)]
pub struct RankedMatches {
    pub idea: Idea,
    /// Eligible mentors that passed the prefilter and were sent for scoring.
    pub candidates_considered: usize,
    pub candidates_scored: usize,
    pub ranked: Vec<ScoredCandidate>,
}

impl RankedMatches {
    fn empty(idea: Idea) -> Self {
        Self {
            idea,
            candidates_considered: 0,
            candidates_scored: 0,
            ranked: Vec::new(),
        }
    }
}

/// Loads an idea and its mentor pool, scores every plausible mentor and
/// keeps the strongest matches.
pub struct MentorMatcher {
    store: Arc<dyn MatchStore>,
    scorer: Arc<dyn FitScorer>,
    prefilter: MentorPreFilter,
    config: MatchingConfig,
}

impl MentorMatcher {
    pub fn new(
        store: Arc<dyn MatchStore>,
        scorer: Arc<dyn FitScorer>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            store,
            scorer,
            prefilter: MentorPreFilter::new(),
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Score and rank mentors for an idea without persisting anything.
    #[instrument(skip(self), fields(scorer = self.scorer.name()))]
    pub async fn rank(&self, idea_id: Uuid) -> Result<RankedMatches, MatchError> {
        counter!(MATCH_RUNS_TOTAL).increment(1);

        let idea = self
            .store
            .fetch_idea(idea_id)
            .await
            .map_err(MatchError::IdeaLookup)?
            .ok_or(MatchError::IdeaNotFound(idea_id))?;

        let mentor_ids = self
            .store
            .fetch_mentor_user_ids()
            .await
            .map_err(MatchError::CandidateLookup)?;
        if mentor_ids.is_empty() {
            info!("no users hold a mentor role");
            return Ok(RankedMatches::empty(idea));
        }

        let profiles = self
            .store
            .fetch_mentor_profiles(&mentor_ids)
            .await
            .map_err(MatchError::CandidateLookup)?;
        let eligible: Vec<MentorProfile> = profiles
            .into_iter()
            .filter(MentorProfile::is_eligible)
            .collect();

        let candidates: Vec<MentorProfile> = self
            .prefilter
            .filter_candidates(&idea, &eligible)
            .into_iter()
            .cloned()
            .collect();
        debug!(
            mentor_ids = mentor_ids.len(),
            eligible = eligible.len(),
            candidates = candidates.len(),
            "prefiltered mentor pool"
        );

        let candidates_considered = candidates.len();
        let scored = self.score_candidates(&idea, candidates).await;
        let candidates_scored = scored.len();
        let ranked = rank_scored(scored, &self.config.ranking);

        info!(
            candidates_considered,
            candidates_scored,
            ranked = ranked.len(),
            "ranked mentor candidates"
        );

        Ok(RankedMatches {
            idea,
            candidates_considered,
            candidates_scored,
            ranked,
        })
    }

    /// Rank mentors for an idea and persist the kept matches in one batch.
    pub async fn score_matches(&self, idea_id: Uuid) -> Result<Vec<MentorMatch>, MatchError> {
        let RankedMatches { idea, ranked, .. } = self.rank(idea_id).await?;
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<_> = ranked.iter().map(|candidate| candidate.to_insert(&idea)).collect();
        let stored = self
            .store
            .insert_mentor_matches(&rows)
            .await
            .map_err(MatchError::Persistence)?;

        counter!(PERSISTED_TOTAL).increment(stored.len() as u64);
        info!(idea_id = %idea.id, persisted = stored.len(), "stored mentor matches");

        Ok(stored)
    }

    /// Results come back in candidate order regardless of concurrency.
    async fn score_candidates(
        &self,
        idea: &Idea,
        candidates: Vec<MentorProfile>,
    ) -> Vec<ScoredCandidate> {
        let concurrency = self.config.scoring_concurrency.max(1);

        stream::iter(candidates)
            .map(|mentor| async move { self.score_candidate(idea, &mentor).await })
            .buffered(concurrency)
            .filter_map(|scored| async move { scored })
            .collect()
            .await
    }

    async fn score_candidate(&self, idea: &Idea, mentor: &MentorProfile) -> Option<ScoredCandidate> {
        let started = Instant::now();
        let timeout = self.config.scoring_timeout;

        let outcome = match tokio::time::timeout(timeout, self.scorer.score(idea, mentor)).await {
            Ok(result) => result,
            Err(_) => Err(ScoringError::Timeout(timeout)),
        };
        histogram!(SCORING_SECONDS).record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(card) => {
                counter!(CANDIDATES_SCORED_TOTAL).increment(1);
                Some(ScoredCandidate {
                    mentor_id: mentor.user_id,
                    mentor_name: mentor.full_name.clone(),
                    card,
                })
            }
            Err(err) => {
                counter!(SCORING_FAILURES_TOTAL).increment(1);
                warn!(
                    mentor_id = %mentor.user_id,
                    error = %err,
                    "skipping mentor after scoring failure"
                );
                None
            }
        }
    }
}
