use tokio_postgres::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::util::{text_array, timed};
use crate::db::{PgPool, StoreError};
use crate::{MENTOR_ROLES, MentorProfile};

const SELECT_MENTOR_USER_IDS: &str = "SELECT DISTINCT user_id
     FROM user_roles
     WHERE role::text = ANY($1)
     ORDER BY user_id";

// Order by user id so candidate order, and therefore ranking ties, is stable
// across runs.
const SELECT_MENTOR_PROFILES: &str = "SELECT user_id, full_name, startup_name, startup_domain,
            tech_stack, domain_preferences, expertise, help_areas,
            COALESCE(mentorship_availability, false) AS mentorship_availability
     FROM profiles
     WHERE user_id = ANY($1)
       AND mentorship_availability = true
       AND NULLIF(btrim(startup_name), '') IS NOT NULL
       AND NULLIF(btrim(startup_domain), '') IS NOT NULL
     ORDER BY user_id";

fn map_mentor_profile(row: &Row) -> Result<MentorProfile, tokio_postgres::Error> {
    Ok(MentorProfile {
        user_id: row.try_get("user_id")?,
        full_name: row.try_get("full_name")?,
        startup_name: row.try_get("startup_name")?,
        startup_domain: row.try_get("startup_domain")?,
        tech_stack: text_array(row.try_get("tech_stack")?),
        domain_preferences: text_array(row.try_get("domain_preferences")?),
        expertise: text_array(row.try_get("expertise")?),
        help_areas: text_array(row.try_get("help_areas")?),
        mentorship_availability: row.try_get("mentorship_availability")?,
    })
}

#[instrument(skip(pool))]
pub async fn fetch_mentor_user_ids(pool: &PgPool) -> Result<Vec<Uuid>, StoreError> {
    let client = pool.get().await?;
    let stmt = client.prepare_cached(SELECT_MENTOR_USER_IDS).await?;
    let roles: &[&str] = &MENTOR_ROLES;

    let rows = timed("fetch_mentor_user_ids", client.query(&stmt, &[&roles])).await?;

    let ids = rows
        .iter()
        .map(|row| row.try_get::<_, Uuid>("user_id"))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = ids.len(), "loaded mentor user ids");
    Ok(ids)
}

#[instrument(skip(pool, user_ids), fields(user_ids = user_ids.len()))]
pub async fn fetch_mentor_profiles(
    pool: &PgPool,
    user_ids: &[Uuid],
) -> Result<Vec<MentorProfile>, StoreError> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let client = pool.get().await?;
    let stmt = client.prepare_cached(SELECT_MENTOR_PROFILES).await?;

    let rows = timed("fetch_mentor_profiles", client.query(&stmt, &[&user_ids])).await?;

    rows.iter()
        .map(map_mentor_profile)
        .collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::from)
}
