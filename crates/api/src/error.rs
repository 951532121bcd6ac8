//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Responses carry a JSON body of the form
//! `{"detail": "..."}` so clients get enough to correct a bad request
//! without ever seeing internals.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::media::MediaError;
use crate::services::stripe::StripeError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment processor operation failed.
    #[error("Stripe error: {0}")]
    Stripe(#[from] StripeError),

    /// Image host operation failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cart line quantity is not a positive integer.
    #[error("Invalid quantity for {product}: {quantity}")]
    InvalidQuantity { product: String, quantity: i32 },

    /// Requested more units than are in stock.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i32,
        requested: i32,
    },

    /// A stored record violates its own invariants.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// No valid cart lines were submitted.
    #[error("Cart is empty")]
    EmptyCart,

    /// Caller is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Proposed order status is not one of the defined values.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// A required external integration is not configured.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Payment amount is below the processor minimum.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Webhook signature did not verify.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Webhook payload did not parse.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => err.status(),
            Self::Stripe(err) => err.status(),
            Self::Media(MediaError::Unconfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Media(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidQuantity { .. }
            | Self::InsufficientStock { .. }
            | Self::InvalidState(_)
            | Self::EmptyCart
            | Self::InvalidStatus(_)
            | Self::InvalidAmount(_)
            // Signature and payload failures are deliberately 4xx: a 5xx
            // would make the provider retry a payload it can never fix.
            | Self::InvalidSignature
            | Self::InvalidPayload(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Internals are never exposed.
    fn detail(&self) -> String {
        match self {
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => err.detail(),
            Self::Media(MediaError::Unconfigured) => {
                "Image hosting is not configured".to_string()
            }
            Self::Media(_) => "Image host error".to_string(),
            Self::Stripe(StripeError::Unconfigured) => {
                "Payments are not configured".to_string()
            }
            // Provider messages (card declined, amount too small) are meant
            // for the cardholder and pass through verbatim.
            Self::Stripe(StripeError::Api { message, .. }) => message.clone(),
            Self::Stripe(_) => "Payment provider error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Media(MediaError::Upstream { .. })
                | Self::Stripe(StripeError::Transport(_) | StripeError::Api { .. })
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "detail": self.detail() }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::InsufficientStock {
            product: "Linen Shirt".to_string(),
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Linen Shirt: available 1, requested 2"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(get_status(AppError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::ServiceUnavailable("stripe".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_webhook_failures_are_client_errors() {
        // 4xx so the provider gives up instead of retrying forever
        assert_eq!(get_status(AppError::InvalidSignature), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::InvalidPayload("bad json".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let err = AppError::Internal("connection string with password".to_string());
        assert_eq!(err.detail(), "Internal server error");
    }

    #[test]
    fn test_provider_message_reaches_the_client() {
        let err = AppError::Stripe(StripeError::Api {
            status: 402,
            message: "Your card was declined.".to_string(),
        });
        assert_eq!(err.detail(), "Your card was declined.");

        // Transport and parse failures stay generic
        let err = AppError::Stripe(StripeError::Parse("unexpected body".to_string()));
        assert_eq!(err.detail(), "Payment provider error");
    }
}
