pub mod api;
pub mod db;
pub mod logging;
pub mod matching;
pub mod scoring;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Roles whose holders may be proposed as mentors.
pub const MENTOR_ROLES: [&str; 2] = ["alumni", "faculty"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum IdeaStage {
    Idea,
    Validation,
    Mvp,
    Growth,
    Scaling,
}

impl IdeaStage {
    /// Unknown stage labels are tolerated and treated as unspecified.
    pub fn parse_lenient(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|value| !value.is_empty())
            .and_then(|value| value.parse().ok())
    }
}

// Commonly used data models for matching functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    /// Owner of the idea; recorded as the student on every match.
    pub user_id: Uuid,
    pub title: String,
    pub tags: Vec<String>,
    pub tech_stack: Vec<String>,
    /// Stage label as stored; unknown labels are kept.
    pub stage: Option<String>,
}

impl Idea {
    /// Known stages in canonical form, anything else as written.
    pub fn stage_label(&self) -> Option<String> {
        let raw = self
            .stage
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())?;

        Some(match IdeaStage::parse_lenient(Some(raw)) {
            Some(stage) => stage.to_string(),
            None => raw.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentorProfile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub startup_name: Option<String>,
    pub startup_domain: Option<String>,
    pub tech_stack: Vec<String>,
    pub domain_preferences: Vec<String>,
    pub expertise: Vec<String>,
    pub help_areas: Vec<String>,
    pub mentorship_availability: bool,
}

fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl MentorProfile {
    /// Availability plus a populated startup profile. The role check lives in
    /// the store because roles are held outside the profile row.
    pub fn is_eligible(&self) -> bool {
        self.mentorship_availability && is_filled(&self.startup_name) && is_filled(&self.startup_domain)
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Unknown mentor")
    }
}
