//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EXECUTIVE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `NOTIFY_SECRET` (or `NODE_NOTIFY_SECRET`) - Shared secret for the payment webhook
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 8080)
//! - `APP_ENV` - Environment name (default: development)
//! - `JWT_EXPIRATION_SECONDS` - Token lifetime (default: 604800, one week)
//! - `RATE_LIMIT_BURST` - Token bucket capacity (default: 50)
//! - `RATE_LIMIT_REFILL_PER_SECOND` - Token bucket refill rate (default: 1.0)
//! - `RATE_LIMIT_IDLE_TTL_SECONDS` - Idle bucket eviction (default: 600)
//! - `RATE_LIMIT_REDIS_URL` - Use the Redis fixed-window limiter instead
//! - `RATE_LIMIT_PER_MINUTE` - Redis limiter budget per key (default: 100)
//! - `CATALOG_WRITES_REQUIRE_AUTH` - Gate category/product mutations (default: true)
//! - `LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: `APP_ENV`)
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SIGNING_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `pretty` or `json`, got `{other}`")),
        }
    }
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment name (development, staging, production)
    pub app_env: String,
    /// HMAC key for bearer tokens
    pub jwt_secret: SecretString,
    /// Lifetime of issued bearer tokens
    pub jwt_expiration: Duration,
    /// Shared secret the payment bridge sends in `X-Node-Notify-Secret`
    pub notify_secret: SecretString,
    /// Whether category/product writes need a logged-in user
    pub catalog_writes_require_auth: bool,
    pub rate_limit: RateLimitConfig,
    pub log_format: LogFormat,
    pub sentry: SentryConfig,
}

/// Admission control settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Token bucket capacity
    pub burst: u32,
    /// Tokens added per second
    pub refill_per_second: f64,
    /// Buckets untouched for this long are dropped
    pub idle_ttl: Duration,
    /// When set, the Redis fixed-window limiter replaces the local buckets
    pub redis_url: Option<SecretString>,
    /// Requests per key per minute for the Redis limiter
    pub per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 50,
            refill_per_second: 1.0,
            idle_ttl: Duration::from_secs(600),
            redis_url: None,
            per_minute: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("EXECUTIVE_DATABASE_URL")?;
        let host = get_parsed_or_default::<IpAddr>("API_HOST", "127.0.0.1")?;
        let port = get_parsed_or_default::<u16>("API_PORT", "8080")?;
        let app_env = get_env_or_default("APP_ENV", "development");

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_signing_secret(&jwt_secret, "JWT_SECRET")?;
        let jwt_expiration =
            Duration::from_secs(get_parsed_or_default::<u64>("JWT_EXPIRATION_SECONDS", "604800")?);
        if jwt_expiration.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "JWT_EXPIRATION_SECONDS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let notify_secret = get_notify_secret()?;
        let catalog_writes_require_auth =
            get_parsed_or_default::<bool>("CATALOG_WRITES_REQUIRE_AUTH", "true")?;
        let rate_limit = RateLimitConfig::from_env()?;
        let log_format = get_parsed_or_default::<LogFormat>("LOG_FORMAT", "pretty")?;
        let sentry = SentryConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            app_env,
            jwt_secret,
            jwt_expiration,
            notify_secret,
            catalog_writes_require_auth,
            rate_limit,
            log_format,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl RateLimitConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let burst = get_parsed_or_default::<u32>("RATE_LIMIT_BURST", "50")?;
        if burst == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RATE_LIMIT_BURST".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let refill_per_second = get_parsed_or_default::<f64>("RATE_LIMIT_REFILL_PER_SECOND", "1.0")?;
        if !refill_per_second.is_finite() || refill_per_second <= 0.0 {
            return Err(ConfigError::InvalidEnvVar(
                "RATE_LIMIT_REFILL_PER_SECOND".to_string(),
                "must be a positive number".to_string(),
            ));
        }
        let idle_ttl =
            Duration::from_secs(get_parsed_or_default::<u64>("RATE_LIMIT_IDLE_TTL_SECONDS", "600")?);
        let per_minute = get_parsed_or_default::<u32>("RATE_LIMIT_PER_MINUTE", "100")?;
        if per_minute == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "RATE_LIMIT_PER_MINUTE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            burst,
            refill_per_second,
            idle_ttl,
            redis_url: get_optional_env("RATE_LIMIT_REDIS_URL").map(SecretString::from),
            per_minute,
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT")
                .or_else(|| get_optional_env("APP_ENV")),
            sample_rate: get_parsed_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: get_parsed_or_default::<f32>("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// The payment bridge historically called this `NODE_NOTIFY_SECRET`.
fn get_notify_secret() -> Result<SecretString, ConfigError> {
    if std::env::var("NOTIFY_SECRET").is_ok() {
        return get_validated_secret("NOTIFY_SECRET");
    }
    if std::env::var("NODE_NOTIFY_SECRET").is_ok() {
        return get_validated_secret("NODE_NOTIFY_SECRET");
    }
    Err(ConfigError::MissingEnvVar("NOTIFY_SECRET".to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_signing_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SIGNING_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SIGNING_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
