//! Stripe API client for payment intents.
//!
//! Talks to the Stripe v1 REST API (form-encoded) to create and retrieve
//! payment intents. Webhook signature verification and event parsing live
//! in [`webhook`]. Amounts cross this boundary in minor units only;
//! everything else in the system works in decimal currency units.

pub mod webhook;

use std::collections::BTreeMap;
use std::time::Duration;

use axum::http::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use atelier_core::CurrencyCode;

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Per-request timeout for Stripe calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// No API key is configured.
    #[error("Stripe is not configured")]
    Unconfigured,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl StripeError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unconfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::Transport(_) | Self::Api { .. } | Self::Parse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// A payment intent as returned by Stripe.
///
/// `client_secret` is what the storefront hands to Stripe.js to collect the
/// payment; it is safe to return to the authenticated buyer and nobody else.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

/// Business context attached to an intent, echoed back in webhook events.
#[derive(Debug, Clone, Default)]
pub struct IntentMetadata {
    pub user_id: String,
    pub user_email: String,
    pub order_id: Option<String>,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
}

impl StripeClient {
    /// Create a new Stripe API client authenticated with the secret key.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(secret_key: &SecretString) -> Result<Self, StripeError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| StripeError::Parse(format!("Invalid API key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }

    /// Create a payment intent for `amount_minor` units of `currency`.
    ///
    /// Automatic payment methods are enabled so Stripe picks what to offer
    /// at checkout.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response doesn't parse.
    pub async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: CurrencyCode,
        metadata: &IntentMetadata,
    ) -> Result<PaymentIntent, StripeError> {
        let url = format!("{BASE_URL}/payment_intents");

        let mut form: BTreeMap<&str, String> = BTreeMap::new();
        form.insert("amount", amount_minor.to_string());
        form.insert("currency", currency.stripe_code().to_owned());
        form.insert("automatic_payment_methods[enabled]", "true".to_owned());
        form.insert("metadata[user_id]", metadata.user_id.clone());
        form.insert("metadata[user_email]", metadata.user_email.clone());
        if let Some(order_id) = &metadata.order_id {
            form.insert("metadata[order_id]", order_id.clone());
        }

        let response = self.client.post(&url).form(&form).send().await?;
        Self::parse_intent(response).await
    }

    /// Retrieve a payment intent by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response doesn't parse.
    pub async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        let url = format!("{BASE_URL}/payment_intents/{id}");

        let response = self.client.get(&url).send().await?;
        Self::parse_intent(response).await
    }

    async fn parse_intent(response: reqwest::Response) -> Result<PaymentIntent, StripeError> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StripeError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            StripeError::Unconfigured.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            StripeError::Api {
                status: 402,
                message: "card declined".to_owned()
            }
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_payment_intent_parses_stripe_shape() {
        let body = serde_json::json!({
            "id": "pi_3MtwBwLkdIwHu7ix28a3tqPa",
            "object": "payment_intent",
            "amount": 2000,
            "client_secret": "pi_3MtwBwLkdIwHu7ix28a3tqPa_secret_YrKJUKribcBjcG8HVhfZluoGH",
            "currency": "eur",
            "status": "requires_payment_method"
        });

        let intent: PaymentIntent = serde_json::from_value(body).unwrap();
        assert_eq!(intent.id, "pi_3MtwBwLkdIwHu7ix28a3tqPa");
        assert_eq!(intent.amount, 2000);
        assert_eq!(intent.status, "requires_payment_method");
        assert!(intent.client_secret.is_some());
    }
}
