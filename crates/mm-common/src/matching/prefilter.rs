use crate::{Idea, MentorProfile};

/// Why a mentor survived the prefilter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefilterReason {
    DomainOverlap,
    ExpertiseOverlap,
    /// No domain preferences declared; treated as open to any idea.
    OpenToAnything,
}

/// True when any keyword on one side contains, or is contained in, any
/// keyword on the other side, ignoring case.
pub fn keywords_overlap(left: &[String], right: &[String]) -> bool {
    let right_lower: Vec<String> = right.iter().map(|kw| kw.to_lowercase()).collect();

    left.iter().any(|kw| {
        let kw = kw.to_lowercase();
        right_lower
            .iter()
            .any(|other| kw.contains(other.as_str()) || other.contains(kw.as_str()))
    })
}

/// Cheap, recall-biased narrowing of mentor candidates before any scoring
/// call is made. Substring matching is intentionally loose: it may keep
/// unrelated mentors but must not drop plausible ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentorPreFilter;

impl MentorPreFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate_candidate(&self, idea: &Idea, mentor: &MentorProfile) -> Option<PrefilterReason> {
        if keywords_overlap(&mentor.domain_preferences, &idea.tags) {
            return Some(PrefilterReason::DomainOverlap);
        }

        if keywords_overlap(&mentor.expertise, &idea.tech_stack) {
            return Some(PrefilterReason::ExpertiseOverlap);
        }

        if mentor.domain_preferences.is_empty() {
            return Some(PrefilterReason::OpenToAnything);
        }

        None
    }

    /// Survivors keep their input order.
    pub fn filter_candidates<'a>(
        &self,
        idea: &Idea,
        mentors: &'a [MentorProfile],
    ) -> Vec<&'a MentorProfile> {
        mentors
            .iter()
            .filter(|mentor| self.evaluate_candidate(idea, mentor).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn idea(tags: &[&str], tech: &[&str]) -> Idea {
        Idea {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Student budgeting app".into(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            tech_stack: tech.iter().map(|s| s.to_string()).collect(),
            stage: None,
        }
    }

    fn mentor(name: &str, domains: &[&str], expertise: &[&str]) -> MentorProfile {
        MentorProfile {
            user_id: Uuid::new_v4(),
            full_name: Some(name.into()),
            startup_name: Some(format!("{name} Labs")),
            startup_domain: Some("General".into()),
            domain_preferences: domains.iter().map(|s| s.to_string()).collect(),
            expertise: expertise.iter().map(|s| s.to_string()).collect(),
            mentorship_availability: true,
            ..MentorProfile::default()
        }
    }

    #[test]
    fn fintech_example_keeps_overlap_and_open_mentors() {
        let idea = idea(&["FinTech"], &["React"]);
        let a = mentor("A", &["fintech", "banking"], &[]);
        let b = mentor("B", &["HealthTech"], &["Python"]);
        let c = mentor("C", &[], &[]);
        let mentors = vec![a.clone(), b, c.clone()];

        let survivors = MentorPreFilter::new().filter_candidates(&idea, &mentors);

        assert_eq!(survivors, vec![&a, &c]);
    }

    #[test]
    fn reports_why_a_candidate_survived() {
        let filter = MentorPreFilter::new();
        let idea = idea(&["EdTech"], &["TypeScript"]);

        assert_eq!(
            filter.evaluate_candidate(&idea, &mentor("d", &["Tech"], &[])),
            Some(PrefilterReason::DomainOverlap)
        );
        assert_eq!(
            filter.evaluate_candidate(&idea, &mentor("e", &["Retail"], &["typescript, node"])),
            Some(PrefilterReason::ExpertiseOverlap)
        );
        assert_eq!(
            filter.evaluate_candidate(&idea, &mentor("f", &[], &["Go"])),
            Some(PrefilterReason::OpenToAnything)
        );
        assert_eq!(
            filter.evaluate_candidate(&idea, &mentor("g", &["Retail"], &["Go"])),
            None
        );
    }

    #[test]
    fn substring_match_works_in_both_directions() {
        assert!(keywords_overlap(&["AI".into()], &["Generative AI".into()]));
        assert!(keywords_overlap(&["Machine Learning Ops".into()], &["machine learning".into()]));
        assert!(!keywords_overlap(&["Logistics".into()], &["Gaming".into()]));
        assert!(!keywords_overlap(&[], &["Gaming".into()]));
    }

    #[test]
    fn open_mentor_survives_even_with_no_idea_keywords() {
        let idea = idea(&[], &[]);
        let survivors_source = vec![mentor("open", &[], &[]), mentor("closed", &["Food"], &["Rust"])];

        let survivors = MentorPreFilter::new().filter_candidates(&idea, &survivors_source);

        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].full_name.as_deref(), Some("open"));
    }

    #[test]
    fn filtering_twice_yields_the_same_set() {
        let idea = idea(&["FinTech", "AI"], &["React", "Postgres"]);
        let mentors = vec![
            mentor("a", &["fintech"], &[]),
            mentor("b", &["Agriculture"], &["postgres"]),
            mentor("c", &["Media"], &["Unity"]),
            mentor("d", &[], &[]),
        ];
        let filter = MentorPreFilter::new();

        let first = filter.filter_candidates(&idea, &mentors);
        let second = filter.filter_candidates(&idea, &mentors);
        let refiltered: Vec<MentorProfile> = first.iter().map(|m| (*m).clone()).collect();
        let third = filter.filter_candidates(&idea, &refiltered);

        assert_eq!(first, second);
        assert_eq!(first.len(), third.len());
        assert!(first.iter().zip(third.iter()).all(|(x, y)| x == y));
    }
}
