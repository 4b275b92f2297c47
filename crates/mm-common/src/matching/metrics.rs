use metrics::{Unit, describe_counter, describe_histogram};

pub const MATCH_RUNS_TOTAL: &str = "mentor_match_runs_total";
pub const CANDIDATES_SCORED_TOTAL: &str = "mentor_match_candidates_scored_total";
pub const SCORING_FAILURES_TOTAL: &str = "mentor_match_scoring_failures_total";
pub const PERSISTED_TOTAL: &str = "mentor_match_persisted_total";
pub const SCORING_SECONDS: &str = "mentor_match_scoring_seconds";

/// Register descriptions with whichever recorder is installed.
pub fn describe_match_metrics() {
    describe_counter!(MATCH_RUNS_TOTAL, "Mentor match pipeline invocations");
    describe_counter!(
        CANDIDATES_SCORED_TOTAL,
        "Mentor candidates that received a usable score"
    );
    describe_counter!(
        SCORING_FAILURES_TOTAL,
        "Scoring calls skipped after a transport, status, timeout or parse failure"
    );
    describe_counter!(PERSISTED_TOTAL, "Mentor match rows written");
    describe_histogram!(
        SCORING_SECONDS,
        Unit::Seconds,
        "Latency of a single scoring call"
    );
}
