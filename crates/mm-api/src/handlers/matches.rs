use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

use mm_common::api::match_request::MatchMentorsRequest;
use mm_common::api::match_response::MentorMatch;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Score mentors for an idea and return the rows that were stored.
pub async fn match_mentors(
    State(state): State<SharedState>,
    auth: AuthUser,
    payload: Result<Json<MatchMentorsRequest>, JsonRejection>,
) -> Result<Json<Vec<MentorMatch>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let idea_id = request.parse_idea_id()?;

    info!(%idea_id, caller = %auth.subject, "matching mentors");
    let matches = state.matcher.score_matches(idea_id).await?;

    Ok(Json(matches))
}
