//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from the authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password combination is wrong. Deliberately does not say which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration attempted with an email that is already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password does not meet minimum requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] atelier_core::EmailError),

    /// Bearer token is missing, malformed, or expired.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Password hashing failed.
    #[error("hash error: {0}")]
    Hash(String),

    /// Token signing failed.
    #[error("token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::UserAlreadyExists => StatusCode::CONFLICT,
            Self::WeakPassword(_) | Self::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            Self::Hash(_) | Self::Signing(_) | Self::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::UserAlreadyExists => "An account with this email already exists".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::InvalidEmail(_) => "Invalid email address".to_string(),
            Self::InvalidToken(_) => "Invalid or expired token".to_string(),
            Self::Hash(_) | Self::Signing(_) | Self::Repository(_) => {
                "Authentication error".to_string()
            }
        }
    }
}
