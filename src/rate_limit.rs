//! Sliding-window rate limiting for public form submissions.
//!
//! Each key keeps a log of request timestamps. A request is admitted when
//! fewer than `limit` entries fall inside the trailing window. With Redis the
//! log is a sorted set scored by milliseconds; otherwise a process-local
//! `DashMap` of deques is used. Redis errors and timeouts fall back to the
//! local store for that request. A background task drops local logs whose
//! entries have all left the window.

use std::collections::VecDeque;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::helpers::errors::api_error;
use crate::schemas::AppState;

pub const LEAD_LIMIT: u32 = 5;
pub const LEAD_WINDOW: Duration = Duration::from_secs(60 * 60);
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

const REDIS_TIMEOUT: Duration = Duration::from_millis(250);
const KEY_PREFIX: &str = "ratelimit:leads";

#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis did not answer within {0:?}")]
    Timeout(Duration),
}

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the oldest logged request leaves the window. Zero when
    /// allowed.
    pub retry_after: Duration,
}

#[derive(Clone)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    redis: Option<ConnectionManager>,
    local: Arc<DashMap<String, VecDeque<Instant>>>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("redis", &self.redis.is_some())
            .field("local_keys", &self.local.len())
            .finish()
    }
}

impl RateLimiter {
    /// Process-local limiter.
    pub fn in_memory(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            redis: None,
            local: Arc::new(DashMap::new()),
        }
    }

    /// Limiter for lead submissions. Connects to Redis when a URL is given and
    /// reachable, else stays process-local.
    pub async fn for_leads(redis_url: Option<&str>) -> Self {
        let mut limiter = Self::in_memory(LEAD_LIMIT, LEAD_WINDOW);
        let Some(url) = redis_url else {
            info!("REDIS_URL not set, rate limiting is process-local");
            return limiter;
        };

        match connect(url).await {
            Ok(manager) => {
                info!("Rate limiter connected to Redis");
                limiter.redis = Some(manager);
            }
            Err(e) => warn!("Could not connect to Redis, rate limiting is process-local: {}", e),
        }
        limiter
    }

    /// Name of the store holding the request logs.
    pub fn store(&self) -> &'static str {
        if self.redis.is_some() { "redis" } else { "memory" }
    }

    /// Records a request for `key` and reports whether it is admitted.
    /// Rejected requests are not logged.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        if let Some(manager) = &self.redis {
            match self.check_redis(manager.clone(), key).await {
                Ok(decision) => return decision,
                Err(e) => warn!("Redis rate limit check failed, using local store: {}", e),
            }
        }
        self.check_local(key, Instant::now())
    }

    /// Drops every local log with no request left inside the window and
    /// returns the number of keys kept.
    pub fn cleanup_expired(&self, now: Instant) -> usize {
        self.local.retain(|_, log| {
            while log
                .front()
                .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
            {
                log.pop_front();
            }
            !log.is_empty()
        });
        self.local.len()
    }

    fn check_local(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut log = self.local.entry(key.to_string()).or_default();
        while log
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
        {
            log.pop_front();
        }

        let used = log.len() as u32;
        if used >= self.limit {
            let retry_after = log
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return self.rejected(retry_after);
        }

        log.push_back(now);
        self.admitted(used + 1)
    }

    async fn check_redis(
        &self,
        mut conn: ConnectionManager,
        key: &str,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let redis_key = format!("{}:{}", KEY_PREFIX, key);
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = self.window.as_millis() as i64;
        let member = format!("{}-{:016x}", now_ms, rand::random::<u64>());

        let (count,): (u32,) = with_timeout(
            redis::pipe()
                .atomic()
                .zrembyscore(&redis_key, 0, now_ms - window_ms)
                .ignore()
                .zcard(&redis_key)
                .zadd(&redis_key, &member, now_ms)
                .ignore()
                .pexpire(&redis_key, window_ms)
                .ignore()
                .query_async(&mut conn),
        )
        .await?;

        if count < self.limit {
            return Ok(self.admitted(count + 1));
        }

        // Over the limit: drop the entry just added so rejections do not
        // extend the block.
        let oldest: Vec<(String, f64)> = with_timeout(
            redis::pipe()
                .atomic()
                .zrem(&redis_key, &member)
                .ignore()
                .zrange_withscores(&redis_key, 0, 0)
                .query_async::<(Vec<(String, f64)>,)>(&mut conn),
        )
        .await?
        .0;

        let retry_after = oldest
            .first()
            .map(|(_, score)| (*score as i64 + window_ms - now_ms).max(0) as u64)
            .map(Duration::from_millis)
            .unwrap_or(self.window);
        Ok(self.rejected(retry_after))
    }

    fn admitted(&self, used: u32) -> RateLimitDecision {
        RateLimitDecision {
            allowed: true,
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            retry_after: Duration::ZERO,
        }
    }

    fn rejected(&self, retry_after: Duration) -> RateLimitDecision {
        RateLimitDecision {
            allowed: false,
            limit: self.limit,
            remaining: 0,
            retry_after,
        }
    }
}

async fn connect(url: &str) -> Result<ConnectionManager, RateLimitError> {
    let client = redis::Client::open(url)?;
    with_timeout(client.get_connection_manager()).await
}

async fn with_timeout<T>(
    future: impl std::future::Future<Output = redis::RedisResult<T>>,
) -> Result<T, RateLimitError> {
    match tokio::time::timeout(REDIS_TIMEOUT, future).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(RateLimitError::Timeout(REDIS_TIMEOUT)),
    }
}

/// Background task that sweeps the local store every `every`.
pub async fn cleanup_rate_limits(limiter: RateLimiter, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let kept = limiter.cleanup_expired(Instant::now());
        debug!("Rate limit sweep kept {} local keys", kept);
    }
}

/// Source address of a request. Behind a trusted proxy this is the first
/// `X-Forwarded-For` hop, then `X-Real-IP`; otherwise those headers are
/// client-controlled and ignored. Falls back to the socket peer, then
/// `"unknown"`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(ip) = forwarded_ip(headers) {
            return ip;
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(HeaderName::from_static(name), value);
    }
}

/// Route middleware for lead submission. Rejected requests never reach the
/// handler.
pub async fn limit_lead_submissions(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let ip = client_ip(request.headers(), peer, state.settings.trust_proxy_headers);

    let decision = state.rate_limiter.check(&ip).await;
    let retry_secs = decision.retry_after.as_secs_f64().ceil() as u64;

    let mut response = if decision.allowed {
        debug!("Lead submission from {} admitted, {} left", ip, decision.remaining);
        next.run(request).await
    } else {
        warn!("Lead submission from {} rate limited", ip);
        let mut response = api_error(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many submissions, please try again later",
        )
        .into_response();
        set_header(response.headers_mut(), "retry-after", retry_secs.max(1));
        response
    };

    let headers = response.headers_mut();
    set_header(headers, "x-ratelimit-limit", decision.limit);
    set_header(headers, "x-ratelimit-remaining", decision.remaining);
    set_header(headers, "x-ratelimit-reset", retry_secs);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sixth_request_in_window_is_rejected() {
        let limiter = RateLimiter::in_memory(LEAD_LIMIT, LEAD_WINDOW);

        for expected_remaining in (0..5).rev() {
            let decision = limiter.check("203.0.113.9").await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let sixth = limiter.check("203.0.113.9").await;
        assert!(!sixth.allowed);
        assert!(sixth.retry_after > Duration::ZERO);
        assert!(sixth.retry_after <= LEAD_WINDOW);

        // Other sources are unaffected
        assert!(limiter.check("198.51.100.1").await.allowed);
    }

    #[test]
    fn test_window_slides() {
        let limiter = RateLimiter::in_memory(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_local("ip", start).allowed);
        assert!(limiter.check_local("ip", start + Duration::from_secs(30)).allowed);
        assert!(!limiter.check_local("ip", start + Duration::from_secs(45)).allowed);

        // The first entry has left the window, the second has not
        let later = limiter.check_local("ip", start + Duration::from_secs(61));
        assert!(later.allowed);
        assert!(!limiter.check_local("ip", start + Duration::from_secs(62)).allowed);
    }

    #[test]
    fn test_cleanup_drops_idle_keys() {
        let limiter = RateLimiter::in_memory(2, Duration::from_secs(60));
        let start = Instant::now();

        for n in 0..50 {
            limiter.check_local(&format!("198.51.100.{}", n), start);
        }
        limiter.check_local("203.0.113.9", start + Duration::from_secs(40));
        assert_eq!(limiter.local.len(), 51);

        // Nothing has expired yet
        assert_eq!(limiter.cleanup_expired(start + Duration::from_secs(30)), 51);

        assert_eq!(limiter.cleanup_expired(start + Duration::from_secs(61)), 1);
        assert!(limiter.local.contains_key("203.0.113.9"));

        assert_eq!(limiter.cleanup_expired(start + Duration::from_secs(101)), 0);
        assert!(limiter.check_local("198.51.100.1", start + Duration::from_secs(102)).allowed);
    }

    #[test]
    fn test_client_ip_precedence() {
        let peer: SocketAddr = "10.0.0.5:4000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer), true), "10.0.0.5");
        assert_eq!(client_ip(&headers, None, true), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.44"));
        assert_eq!(client_ip(&headers, Some(peer), true), "192.0.2.44");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, Some(peer), true), "203.0.113.7");
    }

    #[test]
    fn test_forwarding_headers_ignored_without_trusted_proxy() {
        let peer: SocketAddr = "10.0.0.5:4000".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.0.2.44"));

        assert_eq!(client_ip(&headers, Some(peer), false), "10.0.0.5");
        assert_eq!(client_ip(&headers, None, false), "unknown");
    }
}
