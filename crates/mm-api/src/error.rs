use std::future::Future;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use mm_common::api::match_request::MatchRequestError;
use mm_common::matching::MatchError;

const MAX_PUBLIC_MESSAGE_LEN: usize = 240;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Run `fut` with `request_id` available to any `ApiError` it produces.
pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    match request_id {
        Some(id) => REQUEST_ID.scope(id, fut).await,
        None => fut.await,
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// A record the request depends on is missing. Reported with a server
    /// error status; the `not_found` code tells it apart from store failures.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    request_id: Option<String>,
}

/// Client-supplied text can end up in messages; strip anything that looks
/// like a connection string or filesystem path and bound the length.
fn redact(message: &str) -> String {
    let words: Vec<&str> = message
        .split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|word| !word.is_empty())
        .map(|word| {
            if word.contains("://") {
                "[url]"
            } else if word.starts_with('/') || word.contains('\\') {
                "[path]"
            } else {
                word
            }
        })
        .collect();

    let mut public: String = words.join(" ");
    if public.is_empty() {
        return "unexpected error".into();
    }
    if public.len() > MAX_PUBLIC_MESSAGE_LEN {
        let cut = (0..=MAX_PUBLIC_MESSAGE_LEN)
            .rev()
            .find(|idx| public.is_char_boundary(*idx))
            .unwrap_or(0);
        public.truncate(cut);
        public.push_str("...");
    }
    public
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::INTERNAL_SERVER_ERROR, "not_found"),
            ApiError::TooManyRequests(_) => (StatusCode::TOO_MANY_REQUESTS, "too_many_requests"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Only caller mistakes are echoed back; everything else gets a fixed text.
    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(detail) | ApiError::NotFound(detail) => redact(detail),
            ApiError::Unauthorized(_) => "unauthorized".into(),
            ApiError::TooManyRequests(_) => "too many requests".into(),
            ApiError::ServiceUnavailable(_) => "service unavailable".into(),
            ApiError::Database(_) | ApiError::Internal(_) => "internal server error".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = current_request_id();
        let request_id_field = request_id.as_deref().unwrap_or("");

        if status.is_server_error() {
            error!(code, %status, request_id = request_id_field, error = %self, "request failed");
        } else {
            warn!(code, %status, request_id = request_id_field, error = %self, "request rejected");
        }

        let body = ErrorBody {
            code,
            message: self.public_message(),
            request_id,
        };
        (status, Json(body)).into_response()
    }
}

impl From<MatchRequestError> for ApiError {
    fn from(value: MatchRequestError) -> Self {
        ApiError::BadRequest(value.to_string())
    }
}

impl From<MatchError> for ApiError {
    fn from(value: MatchError) -> Self {
        match value {
            MatchError::IdeaNotFound(id) => ApiError::NotFound(format!("idea {id} not found")),
            other => ApiError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;
    use uuid::Uuid;

    use super::*;

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (parts.status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn includes_request_id_in_response_body_when_present() {
        let err = ApiError::Internal("boom".into());
        let response = with_request_id(Some("req-123".into()), async { err.into_response() }).await;

        let (status, json) = body_json(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["request_id"], "req-123");
        assert_eq!(json["message"], "internal server error");
    }

    #[tokio::test]
    async fn missing_idea_is_a_server_error_with_not_found_code() {
        let id = Uuid::new_v4();
        let response = ApiError::from(MatchError::IdeaNotFound(id)).into_response();

        let (status, json) = body_json(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "not_found");
        assert_eq!(json["message"], format!("idea {id} not found"));
        assert_eq!(json["request_id"], Value::Null);
    }

    #[test]
    fn redact_hides_urls_and_paths() {
        assert_eq!(
            redact("failed at postgres://user:pw@db/app reading /etc/app.env"),
            "failed at [url] reading [path]"
        );
        assert!(redact(&"x".repeat(400)).ends_with("..."));
        assert_eq!(redact(" \n "), "unexpected error");
    }
}
