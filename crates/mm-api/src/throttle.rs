use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{State, connect_info::ConnectInfo},
    http::Request,
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};
use tower_http::request_id::RequestId;

use crate::SharedState;
use crate::config::RateLimitConfig;
use crate::error::{self, ApiError};

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    Global,
    MatchRoute,
}

#[derive(Clone)]
pub struct RateLimits {
    global: Arc<IpRateLimiter>,
    match_route: Arc<IpRateLimiter>,
}

fn keyed_limiter(per_second: u32, burst: u32) -> Arc<IpRateLimiter> {
    let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(rate);

    Arc::new(RateLimiter::keyed(Quota::per_second(rate).allow_burst(burst)))
}

impl RateLimits {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            global: keyed_limiter(config.global_per_sec, config.global_burst),
            match_route: keyed_limiter(config.match_per_sec, config.match_burst),
        }
    }

    pub fn from_env() -> Self {
        Self::new(&RateLimitConfig::from_env())
    }

    /// Requests without a peer address (in-process calls) are never limited.
    pub fn check(&self, scope: LimitScope, client: Option<IpAddr>) -> Result<(), ApiError> {
        let Some(ip) = client else {
            return Ok(());
        };
        let limiter = match scope {
            LimitScope::Global => &self.global,
            LimitScope::MatchRoute => &self.match_route,
        };

        limiter
            .check_key(&ip)
            .map_err(|_| ApiError::TooManyRequests(format!("{scope:?} budget exhausted")))
    }
}

fn peer_ip(req: &Request<Body>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

pub async fn limit_global(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    state.rate_limits.check(LimitScope::Global, peer_ip(&req))?;
    Ok(next.run(req).await)
}

pub async fn limit_match_route(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    state.rate_limits.check(LimitScope::MatchRoute, peer_ip(&req))?;
    Ok(next.run(req).await)
}

/// Make the id assigned by `SetRequestIdLayer` visible to error responses.
pub async fn scope_request_id(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(str::to_owned);

    error::with_request_id(request_id, next.run(req)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_budget_is_separate_from_global_budget() {
        let limits = RateLimits::new(&RateLimitConfig {
            global_per_sec: 1,
            global_burst: 5,
            match_per_sec: 1,
            match_burst: 2,
        });
        let client = Some(IpAddr::from([10, 0, 0, 7]));

        assert!(limits.check(LimitScope::MatchRoute, client).is_ok());
        assert!(limits.check(LimitScope::MatchRoute, client).is_ok());
        assert!(matches!(
            limits.check(LimitScope::MatchRoute, client),
            Err(ApiError::TooManyRequests(_))
        ));
        assert!(limits.check(LimitScope::Global, client).is_ok());
    }

    #[test]
    fn unknown_peers_are_not_limited() {
        let limits = RateLimits::new(&RateLimitConfig {
            global_per_sec: 1,
            global_burst: 1,
            match_per_sec: 1,
            match_burst: 1,
        });

        for _ in 0..5 {
            assert!(limits.check(LimitScope::Global, None).is_ok());
        }
    }
}
