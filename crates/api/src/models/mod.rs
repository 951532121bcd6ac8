//! Domain types for the Atelier API.
//!
//! These are validated domain objects, separate from the request/response
//! DTOs defined next to the route handlers. Structs that map one-to-one onto
//! a table derive `sqlx::FromRow` directly.

pub mod order;
pub mod product;
pub mod user;

pub use order::{Order, OrderLine};
pub use product::{Gender, Product};
pub use user::User;
