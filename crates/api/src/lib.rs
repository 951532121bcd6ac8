//! Atelier API library.
//!
//! This crate provides the shop backend as a library, allowing it to be
//! tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// Assemble the full application router.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", routes::auth_routes())
        .nest("/products", routes::product_routes())
        .nest("/orders", routes::order_routes())
        .nest("/payments", routes::payment_routes())
        .nest("/uploads", routes::upload_routes())
}
