//! Executive API server.
//!
//! # Architecture
//!
//! - Axum JSON API under `/api/v1`
//! - `PostgreSQL` via sqlx (migrations run by `exec-cli migrate`, not on startup)
//! - Per-client rate limiting: in-process token buckets, or a Redis fixed
//!   window when `RATE_LIMIT_REDIS_URL` is set
//! - Sentry error tracking when `SENTRY_DSN` is set
//!
//! # Usage
//!
//! ```bash
//! exec-cli migrate
//! executive-api
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing::Instrument;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use executive_api::config::{ApiConfig, LogFormat, RateLimitConfig};
use executive_api::db::{self, PgStore};
use executive_api::middleware::{LocalRateLimiter, RateLimitPolicy, RedisRateLimiter};
use executive_api::state::AppState;

const REDIS_WINDOW: Duration = Duration::from_secs(60);

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry.sample_rate,
            traces_sample_rate: config.sentry.traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "executive_api=info,tower_http=info".into());

    let fmt_layer = match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

async fn build_rate_limiter(
    limits: &RateLimitConfig,
) -> Result<Arc<dyn RateLimitPolicy>, Box<dyn std::error::Error>> {
    if let Some(url) = &limits.redis_url {
        let limiter =
            RedisRateLimiter::new(url.expose_secret(), limits.per_minute, REDIS_WINDOW).await?;
        tracing::info!(per_minute = limits.per_minute, "Using Redis rate limiter");
        return Ok(Arc::new(limiter));
    }

    tracing::info!(
        burst = limits.burst,
        refill_per_second = limits.refill_per_second,
        "Using in-process rate limiter"
    );
    Ok(Arc::new(LocalRateLimiter::new(
        limits.burst,
        limits.refill_per_second,
        limits.idle_ttl,
    )))
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Failed to load configuration: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_format);

    let root = tracing::info_span!(
        "executive",
        app = "executive-api",
        version = env!("CARGO_PKG_VERSION"),
        env = %config.app_env,
    );
    match run(config).instrument(root).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    let rate_limiter = build_rate_limiter(&config.rate_limit).await?;
    let addr = config.socket_addr();
    let state = AppState::new(config, Arc::new(PgStore::new(pool)), rate_limiter);

    let app = executive_api::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("executive-api listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use executive_api::middleware::rate_limit::RateLimitError;

    use super::*;

    #[tokio::test]
    async fn test_local_limiter_without_redis() {
        let limiter = build_rate_limiter(&RateLimitConfig::default()).await.unwrap();
        assert!(limiter.check("ip:127.0.0.1").await.is_ok());
    }

    #[tokio::test]
    async fn test_redis_failure_keeps_its_source() {
        let limits = RateLimitConfig {
            redis_url: Some(SecretString::from("http://not-a-redis-url")),
            ..RateLimitConfig::default()
        };
        let Err(err) = build_rate_limiter(&limits).await else {
            panic!("a non-redis URL should be rejected");
        };
        assert!(err.downcast_ref::<RateLimitError>().is_some(), "{err}");
    }
}
