//! Helpers for driving the full application over the in-memory store.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use secrecy::SecretString;

use crate::config::{ApiConfig, LogFormat, RateLimitConfig, SentryConfig};
use crate::db::MemoryStore;
use crate::middleware::{LocalRateLimiter, RateLimitPolicy};
use crate::state::AppState;

pub const TEST_JWT_SECRET: &str = "k7Qz9vR2mX4pL8wN3bT6yH1cF5jD0sGa";
pub const TEST_NOTIFY_SECRET: &str = "n4Vb8Qe2Zr7Ty1Ux6Io3Pa9Sd5Fg0Hj";

/// Config with fixed secrets and a generous rate limit.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        app_env: "test".to_string(),
        jwt_secret: SecretString::from(TEST_JWT_SECRET),
        jwt_expiration: Duration::from_secs(3600),
        notify_secret: SecretString::from(TEST_NOTIFY_SECRET),
        catalog_writes_require_auth: true,
        rate_limit: RateLimitConfig {
            burst: 1000,
            refill_per_second: 100.0,
            ..RateLimitConfig::default()
        },
        log_format: LogFormat::Pretty,
        sentry: SentryConfig::default(),
    }
}

/// State over a fresh `MemoryStore` and a local limiter built from `config`.
#[must_use]
pub fn test_state(config: ApiConfig, store: Arc<MemoryStore>) -> AppState {
    let limits = &config.rate_limit;
    let limiter: Arc<dyn RateLimitPolicy> = Arc::new(LocalRateLimiter::new(
        limits.burst,
        limits.refill_per_second,
        limits.idle_ttl,
    ));
    AppState::new(config, store, limiter)
}

/// The full router plus a handle on its store for assertions.
#[must_use]
pub fn test_app(config: ApiConfig) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let app = crate::app(test_state(config, Arc::clone(&store)));
    (app, store)
}
