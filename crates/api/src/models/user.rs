//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use atelier_core::{Email, UserId, UserRole};

/// A registered user.
///
/// The password hash never leaves the `db` layer; this struct is safe to
/// serialize into API responses as-is.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (unique).
    pub email: Email,
    /// Display name.
    pub name: Option<String>,
    /// Access role.
    pub role: UserRole,
    /// Saved shipping street address.
    pub address: Option<String>,
    /// Saved shipping city.
    pub city: Option<String>,
    /// Saved shipping postal code.
    pub postal_code: Option<String>,
    /// Saved shipping country.
    pub country: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
