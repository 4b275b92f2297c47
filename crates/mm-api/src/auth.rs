use axum::async_trait;
use axum::extract::FromRef;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, AsHeaderName};
use axum::http::request::Parts;
use clap::ValueEnum;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum AuthMode {
    ApiKey,
    Jwt,
}

/// Symmetric algorithms accepted for session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum JwtAlgorithm {
    Hs256,
    Hs384,
    Hs512,
}

impl JwtAlgorithm {
    pub fn algorithm(self) -> Algorithm {
        match self {
            JwtAlgorithm::Hs256 => Algorithm::HS256,
            JwtAlgorithm::Hs384 => Algorithm::HS384,
            JwtAlgorithm::Hs512 => Algorithm::HS512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_algorithm: JwtAlgorithm,
    /// When unset the `aud` claim is not checked.
    pub jwt_audience: Option<String>,
}

impl AuthConfig {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::ApiKey,
            api_key: Some(key.into()),
            jwt_secret: None,
            jwt_algorithm: JwtAlgorithm::Hs256,
            jwt_audience: None,
        }
    }
}

/// Caller identity attached to an authorized request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// `api_key` for key callers, the token subject for session callers.
    pub subject: String,
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

fn header_value<'a>(parts: &'a Parts, name: impl AsHeaderName) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

fn unauthorized(reason: impl Into<String>) -> ApiError {
    ApiError::Unauthorized(reason.into())
}

impl AuthConfig {
    fn authorize(&self, parts: &Parts) -> Result<AuthUser, ApiError> {
        match self.mode {
            AuthMode::ApiKey => self.check_api_key(parts),
            AuthMode::Jwt => self.check_session_token(parts),
        }
    }

    fn check_api_key(&self, parts: &Parts) -> Result<AuthUser, ApiError> {
        let expected = self
            .api_key
            .as_deref()
            .ok_or_else(|| unauthorized("MM_API_KEY not configured"))?;
        let presented =
            header_value(parts, "x-api-key").ok_or_else(|| unauthorized("X-API-Key header absent"))?;

        if presented != expected {
            return Err(unauthorized("API key mismatch"));
        }
        Ok(AuthUser {
            subject: "api_key".into(),
        })
    }

    fn check_session_token(&self, parts: &Parts) -> Result<AuthUser, ApiError> {
        let secret = self
            .jwt_secret
            .as_deref()
            .ok_or_else(|| unauthorized("JWT_SECRET not configured"))?;
        let token = header_value(parts, AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| unauthorized("bearer token absent"))?;

        let mut validation = Validation::new(self.jwt_algorithm.algorithm());
        match self.jwt_audience.as_deref() {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let decoded = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|err| unauthorized(format!("token rejected: {err}")))?;

        Ok(AuthUser {
            subject: decoded.claims.sub,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        AuthConfig::from_ref(state).authorize(parts)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        aud: &'a str,
        exp: u64,
    }

    fn parts_with_header(name: &str, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    fn jwt_config(audience: Option<&str>) -> AuthConfig {
        AuthConfig {
            mode: AuthMode::Jwt,
            api_key: None,
            jwt_secret: Some("session-secret".into()),
            jwt_algorithm: JwtAlgorithm::Hs256,
            jwt_audience: audience.map(str::to_string),
        }
    }

    fn token(secret: &str, aud: &str, exp_offset: i64) -> String {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
        let claims = TestClaims {
            sub: "student-1",
            aud,
            exp: (now + exp_offset) as u64,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn api_key_must_match() {
        let config = AuthConfig::api_key("k-123");

        assert!(config.authorize(&parts_with_header("x-api-key", "k-123")).is_ok());
        assert!(matches!(
            config.authorize(&parts_with_header("x-api-key", "nope")),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn accepts_session_token_with_expected_audience() {
        let bearer = format!("Bearer {}", token("session-secret", "authenticated", 600));

        let user = jwt_config(Some("authenticated"))
            .authorize(&parts_with_header("authorization", &bearer))
            .unwrap();

        assert_eq!(user.subject, "student-1");
    }

    #[test]
    fn rejects_expired_or_foreign_tokens() {
        let expired = format!("Bearer {}", token("session-secret", "authenticated", -3600));
        let foreign = format!("Bearer {}", token("other-secret", "authenticated", 600));
        let config = jwt_config(None);

        for header in [expired.as_str(), foreign.as_str(), "Token abc", "Bearer "] {
            assert!(config.authorize(&parts_with_header("authorization", header)).is_err());
        }
    }
}
