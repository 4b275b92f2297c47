use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted `mentor_matches` row as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorMatch {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub mentor_id: Uuid,
    pub student_id: Uuid,
    pub domain_match_score: f64,
    pub tech_match_score: f64,
    pub stage_match_score: f64,
    /// 0 to 100
    pub overall_score: f64,
    pub match_reason: String,
    pub created_at: DateTime<Utc>,
}
