//! Integration test helpers for Atelier.
//!
//! # Running Tests
//!
//! ```bash
//! # Start Postgres and run migrations
//! cargo run -p atelier-cli -- migrate
//!
//! # Bootstrap an admin account for the admin-gated tests
//! cargo run -p atelier-cli -- admin create \
//!     -e admin@example.com -n Admin -p "integration-admin-pw"
//!
//! # Start the API, then run the ignored tests
//! cargo run -p atelier-api &
//! cargo test -p atelier-integration-tests -- --ignored
//! ```
//!
//! All tests are `#[ignore]`-gated because they need a running server and
//! database; unit-level behavior is covered in the library crates.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Admin credentials for admin-gated tests, from the environment.
#[must_use]
pub fn admin_credentials() -> (String, String) {
    let email =
        std::env::var("TEST_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password = std::env::var("TEST_ADMIN_PASSWORD")
        .unwrap_or_else(|_| "integration-admin-pw".to_string());
    (email, password)
}

/// A registered user with their bearer token.
pub struct TestUser {
    pub email: String,
    pub password: String,
    pub token: String,
    pub id: String,
}

/// Register a fresh client account and log it in.
///
/// # Panics
///
/// Panics if the server rejects registration or login; every test calling
/// this requires a running, migrated server.
pub async fn register_and_login(client: &Client) -> TestUser {
    let email = format!("shopper-{}@example.com", Uuid::new_v4());
    let password = "correct horse battery".to_string();
    let base = base_url();

    let resp = client
        .post(format!("{base}/auth/register"))
        .json(&json!({ "email": email, "name": "Test Shopper", "password": password }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), 201, "registration should succeed");
    let user: Value = resp.json().await.expect("register body");
    let id = user["id"].as_str().expect("user id").to_string();

    let token = login(client, &email, &password).await;

    TestUser {
        email,
        password,
        token,
        id,
    }
}

/// Log in and return the bearer token.
///
/// # Panics
///
/// Panics if login fails.
pub async fn login(client: &Client, email: &str, password: &str) -> String {
    let base = base_url();
    let resp = client
        .post(format!("{base}/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), 200, "login should succeed");

    let body: Value = resp.json().await.expect("login body");
    body["access_token"]
        .as_str()
        .expect("access_token in login response")
        .to_string()
}

/// Log in as the bootstrap admin.
///
/// # Panics
///
/// Panics if the admin account is missing; create it with the CLI first.
pub async fn admin_token(client: &Client) -> String {
    let (email, password) = admin_credentials();
    login(client, &email, &password).await
}

/// Create a product as admin and return its JSON.
///
/// # Panics
///
/// Panics if creation fails.
pub async fn create_product(client: &Client, token: &str, name: &str, stock: i32) -> Value {
    let base = base_url();
    let resp = client
        .post(format!("{base}/products"))
        .bearer_auth(token)
        .json(&json!({
            "name": name,
            "price": "25.50",
            "stock": stock,
            "sizes": ["M"],
            "colors": ["black"],
        }))
        .send()
        .await
        .expect("create product request failed");
    assert_eq!(resp.status(), 201, "product creation should succeed");
    resp.json().await.expect("product body")
}

/// A well-formed order payload for one product.
#[must_use]
pub fn order_payload(product_id: &str, quantity: i32) -> Value {
    json!({
        "lines": [{ "product_id": product_id, "quantity": quantity }],
        "shipping": {
            "address": "1 Test Street",
            "city": "Lisbon",
            "postal_code": "1000-001",
            "country": "PT"
        }
    })
}
