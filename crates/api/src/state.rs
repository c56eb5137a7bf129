//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::Store;
use crate::middleware::RateLimitPolicy;
use crate::services::auth::TokenSigner;

/// Application state shared across all handlers.
///
/// Cheaply cloneable; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    tokens: TokenSigner,
    rate_limiter: Arc<dyn RateLimitPolicy>,
}

impl AppState {
    /// Create the state. The token signer is built from the config's JWT
    /// settings.
    #[must_use]
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn Store>,
        rate_limiter: Arc<dyn RateLimitPolicy>,
    ) -> Self {
        let tokens = TokenSigner::new(config.jwt_secret.clone(), config.jwt_expiration);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                tokens,
                rate_limiter,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// The persistence backend.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }

    #[must_use]
    pub fn rate_limiter(&self) -> &dyn RateLimitPolicy {
        self.inner.rate_limiter.as_ref()
    }
}
