//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `AUTH_TOKEN_SECRET` - Bearer-token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 8000)
//! - `AUTH_TOKEN_TTL_MINUTES` - Bearer token lifetime (default: 500)
//! - `STRIPE_SECRET_KEY` - Stripe API key; payment-intent routes return 503 without it
//! - `STRIPE_WEBHOOK_SECRET` - Webhook signing secret; webhook route returns 503 without it
//! - `MEDIA_UPLOAD_URL` - Image host upload endpoint; upload route returns 503 without it
//! - `MEDIA_API_KEY` - Image host credential
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
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

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer-token signing secret
    pub token_secret: SecretString,
    /// Bearer token lifetime in minutes
    pub token_ttl_minutes: u64,
    /// Stripe payment processor configuration
    pub stripe: StripeConfig,
    /// Image host configuration, if any
    pub media: Option<MediaConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Stripe configuration.
///
/// Both fields are optional so the server can run without payments (the
/// affected routes answer 503). Implements `Debug` manually to redact
/// secret fields.
#[derive(Clone, Default)]
pub struct StripeConfig {
    /// Stripe API secret key (sk_...)
    pub secret_key: Option<SecretString>,
    /// Webhook endpoint signing secret (whsec_...)
    pub webhook_secret: Option<SecretString>,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Image host configuration.
#[derive(Clone)]
pub struct MediaConfig {
    /// Upload endpoint URL
    pub upload_url: String,
    /// API credential sent with uploads
    pub api_key: SecretString,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("upload_url", &self.upload_url)
            .field("api_key", &"[REDACTED]")
            .finish()
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
    /// if the token secret fails validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("API_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("API_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_PORT".to_string(), e.to_string()))?;

        let token_secret = get_required_secret("AUTH_TOKEN_SECRET")?;
        validate_token_secret(&token_secret, "AUTH_TOKEN_SECRET")?;

        let token_ttl_minutes = get_env_or_default("AUTH_TOKEN_TTL_MINUTES", "500")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("AUTH_TOKEN_TTL_MINUTES".to_string(), e.to_string())
            })?;

        let stripe = StripeConfig {
            secret_key: get_optional_secret("STRIPE_SECRET_KEY"),
            webhook_secret: get_optional_secret("STRIPE_WEBHOOK_SECRET"),
        };

        let media = match (
            get_optional_env("MEDIA_UPLOAD_URL"),
            get_optional_secret("MEDIA_API_KEY"),
        ) {
            (Some(upload_url), Some(api_key)) => Some(MediaConfig {
                upload_url,
                api_key,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            token_secret,
            token_ttl_minutes,
            stripe,
            media,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an optional environment variable as a secret.
fn get_optional_secret(key: &str) -> Option<SecretString> {
    get_optional_env(key).map(SecretString::from)
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the token-signing secret is long enough, not a placeholder,
/// and has sufficient entropy.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();

    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }

    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("contains placeholder pattern \"{pattern}\""),
            ));
        }
    }

    let entropy = shannon_entropy(value);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need {MIN_ENTROPY_BITS_PER_CHAR})"
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
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_of_uniform_string_is_zero() {
        assert!(shannon_entropy("aaaaaaaa") < f64::EPSILON);
    }

    #[test]
    fn test_entropy_of_random_string_is_high() {
        // 32 distinct characters: 5 bits per char
        let s = "abcdefghijklmnopqrstuvwxyz012345";
        assert!(shannon_entropy(s) > 4.9);
    }

    #[test]
    fn test_token_secret_rejects_short() {
        let secret = SecretString::from("short");
        assert!(matches!(
            validate_token_secret(&secret, "TEST"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_token_secret_rejects_placeholder() {
        let secret = SecretString::from("your-super-long-but-obvious-placeholder-value");
        assert!(validate_token_secret(&secret, "TEST").is_err());
    }

    #[test]
    fn test_token_secret_accepts_random() {
        let secret = SecretString::from("kD92mX4qLp7vRt1bYw8cNz5jFh3gQa6e");
        assert!(validate_token_secret(&secret, "TEST").is_ok());
    }
}
