pub mod client;
pub mod prompt;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Idea, MentorProfile};

pub use client::{ChatCompletionScorer, LlmRuntimeConfig};

const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 100.0;

/// Failure of a single scoring call. Never fatal to a batch.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scoring request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("scoring endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed scoring response: {0}")]
    Malformed(String),
    #[error("scoring call timed out after {0:?}")]
    Timeout(Duration),
}

/// Judgement returned by the text-generation endpoint for one idea/mentor pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub domain_match_score: f64,
    pub tech_match_score: f64,
    pub stage_match_score: f64,
    pub overall_score: f64,
    pub match_reason: String,
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(SCORE_MIN, SCORE_MAX)
}

impl ScoreCard {
    /// Parse the message content of a completion. Replies wrapped in a
    /// Markdown code fence are accepted.
    pub fn parse(content: &str) -> Result<Self, ScoringError> {
        let card: ScoreCard = serde_json::from_str(strip_code_fence(content))
            .map_err(|err| ScoringError::Malformed(err.to_string()))?;

        if [
            card.domain_match_score,
            card.tech_match_score,
            card.stage_match_score,
            card.overall_score,
        ]
        .iter()
        .any(|score| !score.is_finite())
        {
            return Err(ScoringError::Malformed("non-finite score".into()));
        }

        Ok(card.clamped())
    }

    pub fn clamped(self) -> Self {
        Self {
            domain_match_score: clamp_score(self.domain_match_score),
            tech_match_score: clamp_score(self.tech_match_score),
            stage_match_score: clamp_score(self.stage_match_score),
            overall_score: clamp_score(self.overall_score),
            match_reason: self.match_reason.trim().to_string(),
        }
    }
}

/// Produces a fit judgement for one idea/mentor pair.
#[async_trait]
pub trait FitScorer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn score(&self, idea: &Idea, mentor: &MentorProfile) -> Result<ScoreCard, ScoringError>;
}
