//! Business logic services.
//!
//! - `auth` - registration, login, bearer tokens
//! - `orders` - cart validation and transactional order placement
//! - `stripe` - payment intents and webhook verification
//! - `media` - product image uploads

pub mod auth;
pub mod media;
pub mod orders;
pub mod stripe;
