//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use atelier_core::{OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

/// One line of an order: a snapshot of the product at purchase time.
///
/// Write-once. Later catalog edits (price changes, renames, image swaps)
/// must never alter a persisted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderLine {
    /// Product the snapshot was taken from.
    pub product_id: ProductId,
    /// Product name at purchase time.
    pub product_name: String,
    /// Unit price at purchase time.
    pub unit_price: Decimal,
    /// Units ordered.
    pub quantity: i32,
    /// Chosen size facet, if any.
    pub size: Option<String>,
    /// Chosen color facet, if any.
    pub color: Option<String>,
    /// Image shown for the line (falls back to the product's first image).
    pub image: Option<String>,
}

impl OrderLine {
    /// Line subtotal (unit price × quantity).
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A placed order.
///
/// `lines` is populated by a second query; the `#[sqlx(skip)]` default is
/// only a FromRow artifact and never surfaces to callers.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// User who placed the order.
    pub user_id: UserId,
    /// Buyer email, denormalized at order time.
    pub user_email: String,
    /// Buyer name, denormalized at order time.
    pub user_name: Option<String>,
    /// Line snapshots in the order they were submitted.
    #[sqlx(skip)]
    pub lines: Vec<OrderLine>,
    /// Sum of all line subtotals.
    pub total_amount: Decimal,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Payment intent this order is linked to, if any.
    pub payment_intent_id: Option<String>,
    /// Latest payment outcome reported by the processor.
    pub payment_status: Option<PaymentStatus>,
    /// Shipping street address.
    pub shipping_address: Option<String>,
    /// Shipping city.
    pub shipping_city: Option<String>,
    /// Shipping postal code.
    pub shipping_postal_code: Option<String>,
    /// Shipping country.
    pub shipping_country: Option<String>,
    /// Shipping contact phone.
    pub shipping_phone: Option<String>,
    /// Free-text note from the buyer.
    pub notes: Option<String>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}
