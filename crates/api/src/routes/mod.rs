//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Health check
//!
//! # Auth
//! POST /auth/register           - Create an account
//! POST /auth/login              - Login, returns a bearer token
//! GET  /auth/me                 - Current user (requires auth)
//!
//! # Products
//! GET    /products              - Product listing (public)
//! GET    /products/{id}         - Product detail (public)
//! POST   /products              - Create product (admin)
//! PUT    /products/{id}         - Update product (admin)
//! DELETE /products/{id}         - Delete product (admin)
//!
//! # Orders (require auth)
//! POST /orders                  - Place an order
//! GET  /orders                  - Caller's order history
//! GET  /orders/all              - Every order (admin)
//! GET  /orders/{id}             - Order detail (owner or admin)
//! PUT  /orders/{id}/status      - Set lifecycle status (admin)
//!
//! # Payments
//! POST /payments/intent         - Create a payment intent (requires auth)
//! GET  /payments/intent/{id}    - Intent status (requires auth)
//! POST /payments/webhook        - Stripe webhook (signature-verified)
//!
//! # Media
//! POST /uploads                 - Upload a product image (admin, multipart)
//! ```

pub mod auth;
pub mod orders;
pub mod payments;
pub mod products;
pub mod uploads;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create).get(orders::list_mine))
        .route("/all", get(orders::list_all))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", put(orders::update_status))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/intent", post(payments::create_intent))
        .route("/intent/{id}", get(payments::intent_status))
        .route("/webhook", post(payments::webhook))
}

/// Create the media upload routes router.
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/", post(uploads::upload))
}
