//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::services::auth::TokenService;
use crate::services::media::{MediaClient, MediaError};
use crate::services::stripe::{StripeClient, StripeError};

/// Error assembling application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("stripe client: {0}")]
    Stripe(#[from] StripeError),
    #[error("media client: {0}")]
    Media(#[from] MediaError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    tokens: TokenService,
    stripe: Option<StripeClient>,
    media: Option<MediaClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Stripe and the image host are optional integrations; their clients
    /// are only built when the config carries credentials, and the routes
    /// that need them respond 503 otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to build from the config.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(&config.token_secret, config.token_ttl_minutes);

        let stripe = config
            .stripe
            .secret_key
            .as_ref()
            .map(StripeClient::new)
            .transpose()?;

        let media = config.media.as_ref().map(MediaClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                stripe,
                media,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the bearer token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get the Stripe client, if configured.
    #[must_use]
    pub fn stripe(&self) -> Option<&StripeClient> {
        self.inner.stripe.as_ref()
    }

    /// Get the image host client, if configured.
    #[must_use]
    pub fn media(&self) -> Option<&MediaClient> {
        self.inner.media.as_ref()
    }
}
