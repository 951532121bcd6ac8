//! Payment route handlers.
//!
//! The webhook handler must read the raw body before any JSON parsing;
//! signature verification runs over the exact bytes Stripe signed.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use atelier_core::{CurrencyCode, OrderId, Price, STRIPE_MINIMUM_MINOR_UNITS};

use crate::db::orders::OrderRepository;
use crate::error::AppError;
use crate::middleware::auth::CurrentUser;
use crate::services::stripe::{IntentMetadata, StripeClient, webhook};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    /// Amount in the currency's standard unit (e.g., `44.99`).
    pub amount: Decimal,
    /// ISO 4217 code; the shop default when omitted.
    #[serde(default)]
    pub currency: Option<String>,
    /// Order to link the intent to, if one already exists.
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IntentStatusResponse {
    pub payment_intent_id: String,
    pub status: String,
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    pub currency: String,
    /// Local order linked to the intent, if any.
    pub order_id: Option<OrderId>,
}

/// Create a payment intent for the authenticated caller.
pub async fn create_intent(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    let stripe = require_stripe(&state)?;
    let currency = parse_currency(req.currency.as_deref())?;

    let price = Price::new(req.amount, currency);
    let amount_minor = price
        .minor_units()
        .ok_or_else(|| AppError::InvalidAmount(format!("{} is not a chargeable amount", req.amount)))?;
    if amount_minor < STRIPE_MINIMUM_MINOR_UNITS {
        return Err(AppError::InvalidAmount(format!(
            "Amount must be at least {}",
            Price::from_minor_units(STRIPE_MINIMUM_MINOR_UNITS, currency)
        )));
    }

    let metadata = IntentMetadata {
        user_id: user.id.to_string(),
        user_email: user.email.to_string(),
        order_id: req.order_id.map(|id| id.to_string()),
    };

    let intent = stripe
        .create_payment_intent(amount_minor, currency, &metadata)
        .await?;

    tracing::info!(
        intent_id = %intent.id,
        user_id = %user.id,
        amount_minor,
        "payment intent created"
    );

    Ok(Json(CreateIntentResponse {
        payment_intent_id: intent.id,
        client_secret: intent.client_secret,
    }))
}

/// Report the provider-side status of an intent.
///
/// When a local order references the intent, only its owner may look it
/// up; admins audit through the order endpoints, not the payment one.
pub async fn intent_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(intent_id): Path<String>,
) -> Result<Json<IntentStatusResponse>, AppError> {
    let stripe = require_stripe(&state)?;

    let order = OrderRepository::new(state.pool())
        .find_by_payment_intent(&intent_id)
        .await?;
    if let Some(order) = &order {
        if order.user_id != user.id {
            return Err(AppError::Forbidden("Not your payment".to_owned()));
        }
    }

    let intent = stripe.retrieve_payment_intent(&intent_id).await?;
    let currency: CurrencyCode = intent.currency.parse().unwrap_or_default();
    let price = Price::from_minor_units(intent.amount, currency);

    Ok(Json(IntentStatusResponse {
        payment_intent_id: intent.id,
        status: intent.status,
        amount: price.amount,
        currency: currency.code().to_owned(),
        order_id: order.map(|o| o.id),
    }))
}

/// Stripe webhook endpoint.
///
/// Unknown event types are acknowledged with 200 so Stripe doesn't retry
/// them; only verification and payload failures are 4xx.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let secret = webhook_secret(&state)?;
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    webhook::verify_signature(signature, &body, secret, unix_now())?;
    let event = webhook::parse_event(&body)?;

    let orders = OrderRepository::new(state.pool());
    match event {
        webhook::WebhookEvent::PaymentSucceeded { intent_id } => {
            let transitioned = orders.record_payment_success(&intent_id).await?;
            if transitioned {
                tracing::info!(%intent_id, "payment confirmed");
            } else {
                tracing::debug!(%intent_id, "duplicate or unmatched success event");
            }
        }
        webhook::WebhookEvent::PaymentFailed { intent_id } => {
            orders.record_payment_failure(&intent_id).await?;
            tracing::info!(%intent_id, "payment failed");
        }
        webhook::WebhookEvent::Other { event_type } => {
            tracing::debug!(%event_type, "ignoring webhook event");
        }
    }

    Ok(Json(json!({ "received": true })))
}

fn require_stripe(state: &AppState) -> Result<&StripeClient, AppError> {
    state
        .stripe()
        .ok_or_else(|| AppError::ServiceUnavailable("Payments are not configured".to_owned()))
}

fn webhook_secret(state: &AppState) -> Result<&SecretString, AppError> {
    state
        .config()
        .stripe
        .webhook_secret
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Webhook secret not configured".to_owned()))
}

fn parse_currency(raw: Option<&str>) -> Result<CurrencyCode, AppError> {
    match raw {
        None => Ok(CurrencyCode::default()),
        Some(code) => code
            .parse()
            .map_err(|e: String| AppError::BadRequest(e)),
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_currency_when_omitted() {
        assert_eq!(parse_currency(None).expect("default"), CurrencyCode::Eur);
    }

    #[test]
    fn test_unknown_currency_rejected() {
        assert!(parse_currency(Some("JPY")).is_err());
    }

    #[test]
    fn test_minimum_charge_boundary() {
        // 0.49 is below the processor floor, 0.50 is exactly on it.
        let below = Price::new(Decimal::new(49, 2), CurrencyCode::Eur);
        let floor = Price::new(Decimal::new(50, 2), CurrencyCode::Eur);
        assert!(below.minor_units().expect("fits") < STRIPE_MINIMUM_MINOR_UNITS);
        assert_eq!(floor.minor_units().expect("fits"), STRIPE_MINIMUM_MINOR_UNITS);
    }
}
