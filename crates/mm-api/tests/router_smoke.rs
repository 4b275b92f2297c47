use std::sync::Arc;

use axum::{body::Body, http::Request, http::StatusCode};
use mm_common::db::InMemoryMatchStore;
use mm_common::matching::{MatchingConfig, MentorMatcher};
use mm_common::scoring::{ChatCompletionScorer, LlmRuntimeConfig};
use tower::ServiceExt;

fn matcher() -> MentorMatcher {
    MentorMatcher::new(
        Arc::new(InMemoryMatchStore::new()),
        Arc::new(ChatCompletionScorer::new(LlmRuntimeConfig::default()).unwrap()),
        MatchingConfig::default(),
    )
}

#[tokio::test]
async fn livez_healthy_and_match_requires_auth() {
    let state = mm_api::test_state("test-key", matcher());
    let app = mm_api::create_router(state);

    let livez_response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/livez")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(livez_response.status(), StatusCode::OK);

    let unauthorized = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/match-mentors")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"ideaId":"00000000-0000-0000-0000-000000000000"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn preflight_allows_any_origin() {
    let app = mm_api::create_router(mm_api::test_state("test-key", matcher()));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/functions/v1/match-mentors")
                .header("origin", "https://lounge.example.org")
                .header("access-control-request-method", "POST")
                .header(
                    "access-control-request-headers",
                    "authorization, x-client-info, apikey, content-type",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
    let allowed_headers = response
        .headers()
        .get("access-control-allow-headers")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    assert!(allowed_headers.contains("x-client-info"));
    assert!(allowed_headers.contains("apikey"));
}
