//! Per-client admission control.
//!
//! Two policies share the [`RateLimitPolicy`] trait:
//! - [`LocalRateLimiter`]: an in-process token bucket per client key
//!   (`burst` capacity, refilled continuously at `refill_per_second`)
//! - [`RedisRateLimiter`]: a fixed one-minute window counted in Redis, for
//!   deployments running several API instances
//!
//! Client keys are `user:<uuid>` for requests carrying a valid bearer token
//! and `ip:<addr>` otherwise.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use thiserror::Error;

use super::auth::bearer_token;
use crate::error::AppError;
use crate::services::auth::TokenSigner;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit backend error: {0}")]
    Backend(#[from] redis::RedisError),
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

#[async_trait]
pub trait RateLimitPolicy: Send + Sync {
    /// Count one request against `key`.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError` if the backing store cannot be reached.
    async fn check(&self, key: &str) -> Result<RateDecision, RateLimitError>;
}

// =============================================================================
// Token bucket
// =============================================================================

/// A continuously refilling token bucket.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    tokens: f64,
    max_tokens: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket.
    #[must_use]
    pub const fn new(max_tokens: f64, refill_rate: f64, now: Instant) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate,
            last_refill: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = elapsed.mul_add(self.refill_rate, self.tokens).min(self.max_tokens);
        self.last_refill = now;
    }

    /// Refill for the time elapsed up to `now`, then take one token if
    /// available.
    pub fn allow_at(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until one whole token is available.
    #[must_use]
    pub fn retry_after(&self) -> Duration {
        let deficit = (1.0 - self.tokens).max(0.0);
        Duration::try_from_secs_f64(deficit / self.refill_rate).unwrap_or(Duration::MAX)
    }

    #[must_use]
    pub const fn tokens(&self) -> f64 {
        self.tokens
    }
}

/// Longest a bucket may sit idle before eviction; moka rejects longer expiries.
const MAX_IDLE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// In-process limiter: one [`TokenBucket`] per client key.
///
/// Map insertion is atomic (`get_with`), and each bucket has its own lock so
/// unrelated clients never contend.
pub struct LocalRateLimiter {
    buckets: Cache<String, Arc<Mutex<TokenBucket>>>,
    max_tokens: f64,
    refill_rate: f64,
}

impl LocalRateLimiter {
    /// `refill_per_second` must be positive; config loading enforces it.
    #[must_use]
    pub fn new(burst: u32, refill_per_second: f64, idle_ttl: Duration) -> Self {
        let max_tokens = f64::from(burst);
        // An evicted bucket must have been idle long enough to be full again.
        let refill_time =
            Duration::try_from_secs_f64(max_tokens / refill_per_second).unwrap_or(MAX_IDLE_TTL);
        let buckets = Cache::builder()
            .time_to_idle(idle_ttl.max(refill_time).min(MAX_IDLE_TTL))
            .build();
        Self {
            buckets,
            max_tokens,
            refill_rate: refill_per_second,
        }
    }

    async fn bucket(&self, key: &str) -> Arc<Mutex<TokenBucket>> {
        let (max_tokens, refill_rate) = (self.max_tokens, self.refill_rate);
        self.buckets
            .get_with(key.to_owned(), async move {
                Arc::new(Mutex::new(TokenBucket::new(
                    max_tokens,
                    refill_rate,
                    Instant::now(),
                )))
            })
            .await
    }

    /// Take one token for `key`.
    pub async fn allow(&self, key: &str) -> RateDecision {
        let bucket = self.bucket(key).await;
        let mut bucket = bucket.lock();
        if bucket.allow_at(Instant::now()) {
            RateDecision::Allowed
        } else {
            RateDecision::Limited {
                retry_after: bucket.retry_after(),
            }
        }
    }
}

#[async_trait]
impl RateLimitPolicy for LocalRateLimiter {
    async fn check(&self, key: &str) -> Result<RateDecision, RateLimitError> {
        Ok(self.allow(key).await)
    }
}

// =============================================================================
// Redis fixed window
// =============================================================================

/// Shared limiter: at most `limit` requests per key per window, counted in
/// Redis so every API instance sees the same budget.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn_manager: ConnectionManager,
    limit: u32,
    window: Duration,
}

impl RedisRateLimiter {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError` if the URL is invalid or the connection fails.
    pub async fn new(redis_url: &str, limit: u32, window: Duration) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(redis_url)?;
        let conn_manager = ConnectionManager::new(client).await?;
        Ok(Self {
            conn_manager,
            limit,
            window,
        })
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

#[async_trait]
impl RateLimitPolicy for RedisRateLimiter {
    async fn check(&self, key: &str) -> Result<RateDecision, RateLimitError> {
        let window_secs = self.window.as_secs().max(1);
        let now = Self::unix_now();
        let window_index = now / window_secs;
        let rate_key = format!("rate_limit:{key}:{window_index}");

        let mut conn = self.conn_manager.clone();
        #[allow(clippy::cast_possible_wrap)] // Windows are small durations
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(&rate_key, 1)
            .expire(&rate_key, window_secs as i64)
            .ignore()
            .query_async(&mut conn)
            .await?;

        if count > u64::from(self.limit) {
            let remaining = window_secs - now % window_secs;
            return Ok(RateDecision::Limited {
                retry_after: Duration::from_secs(remaining),
            });
        }
        Ok(RateDecision::Allowed)
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Identify the client: the token's user when it verifies, else the IP.
pub fn client_key(
    headers: &HeaderMap,
    uri: &axum::http::Uri,
    peer: Option<SocketAddr>,
    tokens: &TokenSigner,
) -> String {
    if let Some(claims) = bearer_token(headers, uri).and_then(|t| tokens.verify(&t).ok()) {
        return format!("user:{}", claims.user_id);
    }
    client_ip(headers, peer).map_or_else(|| "ip:unknown".to_owned(), |ip| format!("ip:{ip}"))
}

fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    // X-Forwarded-For (first IP in the chain)
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return Some(ip);
    }

    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return Some(ip);
    }

    peer.map(|addr| addr.ip())
}

/// Whole seconds for `Retry-After`, rounded up and never zero.
#[must_use]
pub fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs().saturating_add(u64::from(wait.subsec_nanos() > 0));
    secs.max(1)
}

/// Reject requests over budget with `429` and `Retry-After`.
///
/// # Errors
///
/// Returns `AppError::RateLimited` when the client is over budget, or
/// `AppError::Internal` if the limiter backend fails.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), request.uri(), peer, state.tokens());

    match state.rate_limiter().check(&key).await? {
        RateDecision::Allowed => Ok(next.run(request).await),
        RateDecision::Limited { retry_after } => {
            let retry_after = retry_after_secs(retry_after);
            tracing::warn!(
                key = %key,
                method = %request.method(),
                path = %request.uri().path(),
                retry_after,
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited { retry_after })
        }
    }
}
