//! Stripe webhook signature verification and event parsing.
//!
//! Stripe signs each delivery with a `Stripe-Signature` header of the form
//! `t=<unix>,v1=<hex hmac>` where the HMAC-SHA256 is computed over
//! `"{t}.{raw body}"` with the endpoint's webhook secret. Verification must
//! run over the raw bytes before any JSON parsing, and the timestamp is
//! bounded to defeat replay of captured deliveries.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::AppError;

/// Maximum age of a signed delivery, in seconds.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// A webhook event reduced to what the order system acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// `payment_intent.succeeded`
    PaymentSucceeded { intent_id: String },
    /// `payment_intent.payment_failed`
    PaymentFailed { intent_id: String },
    /// Any other event type; acknowledged and ignored.
    Other { event_type: String },
}

// Only the two payment_intent events need the object id; other event types
// carry objects of arbitrary shape and are acknowledged without one.
#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<RawEventData>,
}

#[derive(Deserialize)]
struct RawEventData {
    #[serde(default)]
    object: Option<RawEventObject>,
}

#[derive(Deserialize)]
struct RawEventObject {
    #[serde(default)]
    id: Option<String>,
}

/// Verify the `Stripe-Signature` header against the raw request body.
///
/// `now` is the verifier's clock as a unix timestamp, passed in so the
/// tolerance window is testable.
///
/// # Errors
///
/// Returns `AppError::InvalidSignature` for a malformed header, a stale
/// timestamp, or an HMAC mismatch, without distinguishing them to the
/// caller.
pub fn verify_signature(
    header: &str,
    body: &[u8],
    secret: &SecretString,
    now: i64,
) -> Result<(), AppError> {
    let (timestamp, signatures) = parse_signature_header(header)?;

    if (now - timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(AppError::InvalidSignature);
    }

    // A header may carry several v1 entries during secret rotation; any one
    // matching is enough. verify_slice is constant-time.
    for signature in signatures {
        let Ok(candidate) = hex::decode(signature) else {
            continue;
        };
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|_| AppError::InvalidSignature)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        if mac.verify_slice(&candidate).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::InvalidSignature)
}

/// Parse a verified body into a [`WebhookEvent`].
///
/// # Errors
///
/// Returns `AppError::InvalidPayload` if the body is not a well-formed
/// event envelope.
pub fn parse_event(body: &[u8]) -> Result<WebhookEvent, AppError> {
    let raw: RawEvent = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidPayload(e.to_string()))?;

    let intent_id = raw.data.and_then(|d| d.object).and_then(|o| o.id);

    match raw.event_type.as_str() {
        "payment_intent.succeeded" => {
            let intent_id = intent_id.ok_or_else(|| {
                AppError::InvalidPayload("missing payment intent id".to_owned())
            })?;
            Ok(WebhookEvent::PaymentSucceeded { intent_id })
        }
        "payment_intent.payment_failed" => {
            let intent_id = intent_id.ok_or_else(|| {
                AppError::InvalidPayload("missing payment intent id".to_owned())
            })?;
            Ok(WebhookEvent::PaymentFailed { intent_id })
        }
        _ => Ok(WebhookEvent::Other {
            event_type: raw.event_type,
        }),
    }
}

/// Split `t=...,v1=...` into the timestamp and all v1 signatures.
fn parse_signature_header(header: &str) -> Result<(i64, Vec<&str>), AppError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<i64>().map_err(|_| AppError::InvalidSignature)?);
            }
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    match (timestamp, signatures.is_empty()) {
        (Some(timestamp), false) => Ok((timestamp, signatures)),
        _ => Err(AppError::InvalidSignature),
    }
}
