use tokio_postgres::Row;
use tracing::instrument;
use uuid::Uuid;

use crate::db::util::{text_array, timed};
use crate::db::{PgPool, StoreError};
use crate::Idea;

const SELECT_IDEA: &str = "SELECT id, user_id, COALESCE(title, '') AS title, tags, tech_stack, stage::text AS stage
     FROM startup_ideas
     WHERE id = $1";

fn map_idea(row: &Row) -> Result<Idea, tokio_postgres::Error> {
    Ok(Idea {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        tags: text_array(row.try_get("tags")?),
        tech_stack: text_array(row.try_get("tech_stack")?),
        stage: row.try_get("stage")?,
    })
}

#[instrument(skip(pool))]
pub async fn fetch_idea(pool: &PgPool, idea_id: Uuid) -> Result<Option<Idea>, StoreError> {
    let client = pool.get().await?;
    let stmt = client.prepare_cached(SELECT_IDEA).await?;

    let row = timed("fetch_idea", client.query_opt(&stmt, &[&idea_id])).await?;

    row.as_ref().map(map_idea).transpose().map_err(StoreError::from)
}
