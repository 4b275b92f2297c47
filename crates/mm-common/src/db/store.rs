use async_trait::async_trait;
use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use uuid::Uuid;

use crate::api::match_response::MentorMatch;
use crate::db::{
    MentorMatchInsert, PgPool, fetch_idea, fetch_mentor_profiles, fetch_mentor_user_ids,
    insert_mentor_matches,
};
use crate::{Idea, MentorProfile};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Reads and writes needed by the mentor match pipeline.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn fetch_idea(&self, idea_id: Uuid) -> Result<Option<Idea>, StoreError>;

    /// User ids holding an alumni or faculty role.
    async fn fetch_mentor_user_ids(&self) -> Result<Vec<Uuid>, StoreError>;

    /// Available profiles with startup name and domain filled, restricted to `user_ids`.
    async fn fetch_mentor_profiles(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<MentorProfile>, StoreError>;

    /// Insert all rows or none; returns the stored rows in input order.
    async fn insert_mentor_matches(
        &self,
        rows: &[MentorMatchInsert],
    ) -> Result<Vec<MentorMatch>, StoreError>;
}

/// `MatchStore` backed by the application's PostgreSQL database.
#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn fetch_idea(&self, idea_id: Uuid) -> Result<Option<Idea>, StoreError> {
        fetch_idea(&self.pool, idea_id).await
    }

    async fn fetch_mentor_user_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        fetch_mentor_user_ids(&self.pool).await
    }

    async fn fetch_mentor_profiles(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<MentorProfile>, StoreError> {
        fetch_mentor_profiles(&self.pool, user_ids).await
    }

    async fn insert_mentor_matches(
        &self,
        rows: &[MentorMatchInsert],
    ) -> Result<Vec<MentorMatch>, StoreError> {
        insert_mentor_matches(&self.pool, rows).await
    }
}
