//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored in the currency's natural unit (e.g., `44.99` EUR) as
//! `rust_decimal::Decimal`, which maps to Postgres `NUMERIC` without rounding
//! error. Payment processors want the smallest currency unit instead, so the
//! conversion to minor units happens here, once, at the boundary.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Smallest charge most card processors will accept, in minor units.
pub const STRIPE_MINIMUM_MINOR_UNITS: i64 = 50;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., euros, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Build a price from an amount in minor units (cents).
    #[must_use]
    pub fn from_minor_units(minor: i64, currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::new(minor, 2),
            currency,
        }
    }

    /// Convert to minor units (cents), rounding to the nearest cent.
    ///
    /// Returns `None` if the amount does not fit in an `i64` after scaling,
    /// which in practice means a nonsensical input.
    #[must_use]
    pub fn minor_units(&self) -> Option<i64> {
        let scaled = self
            .amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp(0);
        scaled.to_i64()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency.code())
    }
}

/// ISO 4217 currency codes accepted by the payment bridge.
///
/// All supported currencies use two decimal places; zero-decimal currencies
/// (JPY and friends) would need a different minor-unit conversion and are
/// deliberately not listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    #[default]
    Eur,
    Usd,
    Gbp,
    Cad,
    Aud,
}

impl CurrencyCode {
    /// Uppercase ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Eur => "EUR",
            Self::Usd => "USD",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
        }
    }

    /// Lowercase code as the Stripe API expects it.
    #[must_use]
    pub const fn stripe_code(&self) -> &'static str {
        match self {
            Self::Eur => "eur",
            Self::Usd => "usd",
            Self::Gbp => "gbp",
            Self::Cad => "cad",
            Self::Aud => "aud",
        }
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EUR" => Ok(Self::Eur),
            "USD" => Ok(Self::Usd),
            "GBP" => Ok(Self::Gbp),
            "CAD" => Ok(Self::Cad),
            "AUD" => Ok(Self::Aud),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}
