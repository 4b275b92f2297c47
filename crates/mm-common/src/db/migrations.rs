use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

// Tables normally already exist in the hosted database; every statement is
// guarded so running against it is a no-op apart from the bookkeeping row.
const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "base tables for ideas, roles, profiles and mentor matches",
        sql: r#"
CREATE TABLE IF NOT EXISTS startup_ideas (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    title TEXT NOT NULL,
    problem TEXT,
    solution TEXT,
    target_user TEXT,
    stage TEXT DEFAULT 'idea',
    tags TEXT[],
    tech_stack TEXT[],
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS user_roles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    role TEXT NOT NULL,
    UNIQUE (user_id, role)
);

CREATE TABLE IF NOT EXISTS profiles (
    user_id UUID PRIMARY KEY,
    full_name TEXT,
    email TEXT,
    startup_name TEXT,
    startup_domain TEXT,
    tech_stack TEXT[],
    domain_preferences TEXT[],
    expertise TEXT[],
    help_areas TEXT[],
    mentorship_availability BOOLEAN DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS mentor_matches (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    idea_id UUID NOT NULL,
    mentor_id UUID NOT NULL,
    student_id UUID NOT NULL,
    domain_match_score DOUBLE PRECISION NOT NULL,
    tech_match_score DOUBLE PRECISION NOT NULL,
    stage_match_score DOUBLE PRECISION NOT NULL,
    overall_score DOUBLE PRECISION NOT NULL,
    match_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#,
    },
    Migration {
        id: 2,
        description: "lookup indexes + overall score range check",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_user_roles_role ON user_roles(role);
CREATE INDEX IF NOT EXISTS idx_mentor_matches_idea ON mentor_matches(idea_id, overall_score DESC);

DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_mentor_matches_overall_range'
    ) THEN
        ALTER TABLE mentor_matches
            ADD CONSTRAINT chk_mentor_matches_overall_range
            CHECK (overall_score >= 0 AND overall_score <= 100);
    END IF;
END $$;
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .try_get(0)?;

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
