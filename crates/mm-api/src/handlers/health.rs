use std::sync::atomic::Ordering;

use axum::{Json, extract::State};
use mm_common::db::PgPool;
use serde_json::{Value, json};
use tokio::time::{Duration, timeout};

use crate::SharedState;
use crate::error::ApiError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn livez() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Check out a connection and run a trivial query, each under a short timeout.
async fn probe_database(pool: &PgPool) -> Result<(), String> {
    let client = match timeout(PROBE_TIMEOUT, pool.get()).await {
        Err(_) => return Err("db_pool_timeout".into()),
        Ok(Err(err)) => return Err(format!("db_pool_unavailable: {err}")),
        Ok(Ok(client)) => client,
    };

    match timeout(PROBE_TIMEOUT, client.simple_query("SELECT 1")).await {
        Err(_) => Err("db_ping_timeout".into()),
        Ok(Err(err)) => Err(format!("db_ping_failed: {err}")),
        Ok(Ok(_)) => Ok(()),
    }
}

pub async fn readyz(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    if !state.readiness.load(Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    probe_database(&state.pool)
        .await
        .map_err(ApiError::ServiceUnavailable)?;

    Ok(Json(json!({
        "status": "ok",
        "database": "ok",
        "scorer": state.matcher.scorer_name(),
        "application": env!("CARGO_PKG_NAME"),
    })))
}
