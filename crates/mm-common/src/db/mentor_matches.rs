use serde::Serialize;
use tokio_postgres::Row;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::match_response::MentorMatch;
use crate::db::util::timed;
use crate::db::{PgPool, StoreError};

const INSERT_MENTOR_MATCH: &str = "INSERT INTO mentor_matches (
        idea_id,
        mentor_id,
        student_id,
        domain_match_score,
        tech_match_score,
        stage_match_score,
        overall_score,
        match_reason
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id, idea_id, mentor_id, student_id, domain_match_score, tech_match_score,
              stage_match_score, overall_score, match_reason, created_at";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentorMatchInsert {
    pub idea_id: Uuid,
    pub mentor_id: Uuid,
    pub student_id: Uuid,
    pub domain_match_score: f64,
    pub tech_match_score: f64,
    pub stage_match_score: f64,
    pub overall_score: f64,
    pub match_reason: String,
}

fn map_mentor_match(row: &Row) -> Result<MentorMatch, tokio_postgres::Error> {
    Ok(MentorMatch {
        id: row.try_get("id")?,
        idea_id: row.try_get("idea_id")?,
        mentor_id: row.try_get("mentor_id")?,
        student_id: row.try_get("student_id")?,
        domain_match_score: row.try_get("domain_match_score")?,
        tech_match_score: row.try_get("tech_match_score")?,
        stage_match_score: row.try_get("stage_match_score")?,
        overall_score: row.try_get("overall_score")?,
        match_reason: row
            .try_get::<_, Option<String>>("match_reason")?
            .unwrap_or_default(),
        created_at: row.try_get("created_at")?,
    })
}

/// Insert the given matches in one transaction and return the stored rows in
/// input order.
#[instrument(skip(pool, rows), fields(rows = rows.len()))]
pub async fn insert_mentor_matches(
    pool: &PgPool,
    rows: &[MentorMatchInsert],
) -> Result<Vec<MentorMatch>, StoreError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut client = pool.get().await?;
    let tx = client.transaction().await?;
    let stmt = tx.prepare(INSERT_MENTOR_MATCH).await?;

    let mut inserted = Vec::with_capacity(rows.len());
    for row in rows {
        let stored = timed(
            "insert_mentor_match",
            tx.query_one(
                &stmt,
                &[
                    &row.idea_id,
                    &row.mentor_id,
                    &row.student_id,
                    &row.domain_match_score,
                    &row.tech_match_score,
                    &row.stage_match_score,
                    &row.overall_score,
                    &row.match_reason,
                ],
            ),
        )
        .await?;
        inserted.push(map_mentor_match(&stored)?);
    }

    tx.commit().await?;

    info!(rows = inserted.len(), "inserted mentor matches");
    Ok(inserted)
}
