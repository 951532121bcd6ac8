//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use atelier_core::ProductId;

/// Gender facet of a catalog product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_gender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unisex,
}

/// A catalog product.
///
/// `stock` is guarded by a `CHECK (stock >= 0)` constraint; the only path
/// that decrements it is the conditional update in
/// `ProductRepository::decrement_stock`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: Option<String>,
    /// Unit price in the shop currency's natural unit.
    pub price: Decimal,
    /// Sellable units currently available.
    pub stock: i32,
    /// Category facet (e.g., "shirts").
    pub category: Option<String>,
    /// Gender facet.
    pub gender: Option<Gender>,
    /// Size facets offered for this product.
    pub sizes: Vec<String>,
    /// Color facets offered for this product.
    pub colors: Vec<String>,
    /// All media references (CDN URLs).
    pub images: Vec<String>,
    /// Subset of `images` shown on the storefront.
    pub visible_images: Vec<String>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// First media reference, used as the fallback image for order lines.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}
