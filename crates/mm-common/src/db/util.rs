use std::{future::Future, sync::OnceLock, time::Instant};

use tracing::warn;

fn slow_query_threshold_ms() -> Option<u64> {
    static CACHE: OnceLock<Option<u64>> = OnceLock::new();

    *CACHE.get_or_init(|| {
        std::env::var("MM_DB_LOG_MIN_DURATION_MS")
            .ok()
            .and_then(|raw| parse_threshold(&raw))
    })
}

fn parse_threshold(raw: &str) -> Option<u64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .map(|v| v.max(0) as u64)
        .filter(|v| *v > 0)
}

fn maybe_log_slow_query(label: &str, started_at: Instant) {
    if let Some(threshold_ms) = slow_query_threshold_ms() {
        let elapsed_ms = started_at.elapsed().as_millis() as u64;
        if elapsed_ms >= threshold_ms {
            warn!(query = label, elapsed_ms, "slow_query_detected");
        }
    }
}

/// Await a database future and log it when it exceeds `MM_DB_LOG_MIN_DURATION_MS`.
pub async fn timed<F, T>(label: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let result = fut.await;
    maybe_log_slow_query(label, started);
    result
}

/// A NULL `text[]` column reads as an empty list. Entries are kept verbatim.
pub fn text_array(value: Option<Vec<String>>) -> Vec<String> {
    value.unwrap_or_default()
}
