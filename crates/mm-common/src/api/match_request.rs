use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Body of a `match-mentors` call as sent by the web client.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchMentorsRequest {
    #[serde(rename = "ideaId", default)]
    pub idea_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchRequestError {
    #[error("ideaId is required")]
    MissingIdeaId,
    #[error("ideaId is not a valid uuid: {0}")]
    InvalidIdeaId(String),
}

impl MatchMentorsRequest {
    pub fn parse_idea_id(&self) -> Result<Uuid, MatchRequestError> {
        let raw = self.idea_id.trim();
        if raw.is_empty() {
            return Err(MatchRequestError::MissingIdeaId);
        }

        Uuid::parse_str(raw).map_err(|_| MatchRequestError::InvalidIdeaId(raw.to_string()))
    }
}
