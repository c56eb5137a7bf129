//! HTTP middleware and request extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 3. Request ID
//! 4. Rate limiting (API routes only; the payment webhook is exempt)

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{CatalogWriter, CurrentUser, NotifySecret};
pub use rate_limit::{
    LocalRateLimiter, RateDecision, RateLimitPolicy, RedisRateLimiter, rate_limit_middleware,
};
pub use request_id::request_id_middleware;
