use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::api::match_response::MentorMatch;
use crate::db::{MatchStore, MentorMatchInsert, StoreError};
use crate::{Idea, MENTOR_ROLES, MentorProfile};

/// Number of calls each store operation has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCallCounts {
    pub idea_lookups: usize,
    pub role_queries: usize,
    pub profile_queries: usize,
    pub inserts: usize,
}

/// Process-local `MatchStore` for tests and local runs without a database.
/// Applies the same role, availability and required-field filters as the
/// SQL queries.
#[derive(Default)]
pub struct InMemoryMatchStore {
    ideas: Mutex<HashMap<Uuid, Idea>>,
    roles: Mutex<Vec<(Uuid, String)>>,
    profiles: Mutex<Vec<MentorProfile>>,
    matches: Mutex<Vec<MentorMatch>>,
    fail_candidate_queries: AtomicBool,
    fail_inserts: AtomicBool,
    idea_lookups: AtomicUsize,
    role_queries: AtomicUsize,
    profile_queries: AtomicUsize,
    inserts: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_idea(&self, idea: Idea) {
        lock(&self.ideas).insert(idea.id, idea);
    }

    pub fn grant_role(&self, user_id: Uuid, role: impl Into<String>) {
        lock(&self.roles).push((user_id, role.into()));
    }

    /// Add a profile, replacing any existing profile for the same user.
    pub fn upsert_profile(&self, profile: MentorProfile) {
        let mut profiles = lock(&self.profiles);
        match profiles.iter_mut().find(|p| p.user_id == profile.user_id) {
            Some(existing) => *existing = profile,
            None => profiles.push(profile),
        }
    }

    /// Add a profile together with the alumni role.
    pub fn add_mentor(&self, profile: MentorProfile) {
        self.grant_role(profile.user_id, MENTOR_ROLES[0]);
        self.upsert_profile(profile);
    }

    pub fn fail_candidate_queries(&self, fail: bool) {
        self.fail_candidate_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn persisted(&self) -> Vec<MentorMatch> {
        lock(&self.matches).clone()
    }

    pub fn call_counts(&self) -> StoreCallCounts {
        StoreCallCounts {
            idea_lookups: self.idea_lookups.load(Ordering::SeqCst),
            role_queries: self.role_queries.load(Ordering::SeqCst),
            profile_queries: self.profile_queries.load(Ordering::SeqCst),
            inserts: self.inserts.load(Ordering::SeqCst),
        }
    }

    fn check_candidate_queries(&self) -> Result<(), StoreError> {
        if self.fail_candidate_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("candidate query rejected".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn fetch_idea(&self, idea_id: Uuid) -> Result<Option<Idea>, StoreError> {
        self.idea_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.ideas).get(&idea_id).cloned())
    }

    async fn fetch_mentor_user_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        self.role_queries.fetch_add(1, Ordering::SeqCst);
        self.check_candidate_queries()?;

        let mut ids: Vec<Uuid> = lock(&self.roles)
            .iter()
            .filter(|(_, role)| MENTOR_ROLES.contains(&role.as_str()))
            .map(|(user_id, _)| *user_id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn fetch_mentor_profiles(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<MentorProfile>, StoreError> {
        self.profile_queries.fetch_add(1, Ordering::SeqCst);
        self.check_candidate_queries()?;

        let mut profiles: Vec<MentorProfile> = lock(&self.profiles)
            .iter()
            .filter(|profile| user_ids.contains(&profile.user_id) && profile.is_eligible())
            .cloned()
            .collect();
        profiles.sort_by_key(|profile| profile.user_id);
        Ok(profiles)
    }

    async fn insert_mentor_matches(
        &self,
        rows: &[MentorMatchInsert],
    ) -> Result<Vec<MentorMatch>, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert rejected".into()));
        }

        let created_at = Utc::now();
        let stored: Vec<MentorMatch> = rows
            .iter()
            .map(|row| MentorMatch {
                id: Uuid::new_v4(),
                idea_id: row.idea_id,
                mentor_id: row.mentor_id,
                student_id: row.student_id,
                domain_match_score: row.domain_match_score,
                tech_match_score: row.tech_match_score,
                stage_match_score: row.stage_match_score,
                overall_score: row.overall_score,
                match_reason: row.match_reason.clone(),
                created_at,
            })
            .collect();

        lock(&self.matches).extend(stored.iter().cloned());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(available: bool) -> MentorProfile {
        MentorProfile {
            user_id: Uuid::new_v4(),
            startup_name: Some("Acme".into()),
            startup_domain: Some("Robotics".into()),
            mentorship_availability: available,
            ..MentorProfile::default()
        }
    }

    #[tokio::test]
    async fn role_query_only_returns_alumni_and_faculty() {
        let store = InMemoryMatchStore::new();
        let alumni = Uuid::new_v4();
        let faculty = Uuid::new_v4();
        store.grant_role(alumni, "alumni");
        store.grant_role(faculty, "faculty");
        store.grant_role(Uuid::new_v4(), "student");

        let mut ids = store.fetch_mentor_user_ids().await.unwrap();
        ids.sort();
        let mut expected = vec![alumni, faculty];
        expected.sort();

        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn profile_query_applies_eligibility() {
        let store = InMemoryMatchStore::new();
        let available = profile(true);
        let unavailable = profile(false);
        store.add_mentor(available.clone());
        store.add_mentor(unavailable.clone());

        let profiles = store
            .fetch_mentor_profiles(&[available.user_id, unavailable.user_id])
            .await
            .unwrap();

        assert_eq!(profiles, vec![available]);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let store = InMemoryMatchStore::new();
        store.fail_candidate_queries(true);
        store.fail_inserts(true);

        assert!(store.fetch_mentor_user_ids().await.is_err());
        assert!(store.insert_mentor_matches(&[]).await.is_err());
        assert_eq!(store.call_counts().role_queries, 1);
        assert_eq!(store.call_counts().inserts, 1);
    }
}
