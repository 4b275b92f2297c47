use crate::{Idea, MentorProfile};

pub const SYSTEM_PROMPT: &str = "You are a mentor-matching expert. Analyze domain fit, technical \
alignment, and experience relevance. Reply with a single JSON object and nothing else.";

const NOT_SPECIFIED: &str = "Not specified";

fn join_or_default(values: &[String]) -> String {
    let joined = values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    if joined.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        joined
    }
}

fn text_or_default(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_SPECIFIED)
}

/// Build the user prompt for scoring one idea/mentor pair.
pub fn build_match_prompt(idea: &Idea, mentor: &MentorProfile) -> String {
    let stage = idea
        .stage_label()
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());
    let availability = if mentor.mentorship_availability {
        "Available"
    } else {
        "Limited"
    };

    format!(
        "Score this mentor-student match (0-100).

Startup idea:
- Title: {title}
- Domain/Tags: {tags}
- Tech Stack: {idea_tech}
- Stage: {stage}

Mentor profile:
- Name: {name}
- Startup: {startup}
- Domain: {domain}
- Tech Stack: {mentor_tech}
- Expertise: {expertise}
- Help Areas: {help_areas}
- Availability: {availability}

Provide:
1. domain_match_score (0-100): how well the domains align
2. tech_match_score (0-100): how much the tech stacks overlap
3. stage_match_score (0-100): whether the mentor's experience fits the idea stage
4. overall_score (0-100): weighted average of the above
5. match_reason: 2-3 sentences explaining why this is a good (or bad) match

Respond as JSON:
{{
  \"domain_match_score\": <number>,
  \"tech_match_score\": <number>,
  \"stage_match_score\": <number>,
  \"overall_score\": <number>,
  \"match_reason\": \"<string>\"
}}",
        title = text_or_default(Some(idea.title.as_str())),
        tags = join_or_default(&idea.tags),
        idea_tech = join_or_default(&idea.tech_stack),
        name = mentor.display_name(),
        startup = text_or_default(mentor.startup_name.as_deref()),
        domain = text_or_default(mentor.startup_domain.as_deref()),
        mentor_tech = join_or_default(&mentor.tech_stack),
        expertise = join_or_default(&mentor.expertise),
        help_areas = join_or_default(&mentor.help_areas),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn prompt_carries_idea_and_mentor_fields() {
        let idea = Idea {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Split bills for dorms".into(),
            tags: vec!["FinTech".into()],
            tech_stack: vec!["React".into(), "Supabase".into()],
            stage: Some("MVP".into()),
        };
        let mentor = MentorProfile {
            user_id: Uuid::new_v4(),
            full_name: Some("Ken".into()),
            startup_name: Some("PayLoop".into()),
            startup_domain: Some("Payments".into()),
            expertise: vec!["react".into()],
            mentorship_availability: true,
            ..MentorProfile::default()
        };

        let prompt = build_match_prompt(&idea, &mentor);

        assert!(prompt.contains("- Title: Split bills for dorms"));
        assert!(prompt.contains("- Tech Stack: React, Supabase"));
        assert!(prompt.contains("- Stage: mvp"));
        assert!(prompt.contains("- Startup: PayLoop"));
        assert!(prompt.contains("- Help Areas: Not specified"));
        assert!(prompt.contains("- Availability: Available"));
        assert!(prompt.contains("\"overall_score\": <number>"));
    }
}
