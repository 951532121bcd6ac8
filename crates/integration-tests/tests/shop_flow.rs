//! End-to-end tests for accounts, catalog, and order placement.
//!
//! These tests require:
//! - A running, migrated `PostgreSQL` database
//! - The API server running (cargo run -p atelier-api)
//! - A bootstrap admin account (cargo run -p atelier-cli -- admin create ...)
//!
//! Run with: cargo test -p atelier-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::Value;

use atelier_integration_tests::{
    admin_token, base_url, create_product, order_payload, register_and_login,
};

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_login_me_roundtrip() {
    let client = Client::new();
    let user = register_and_login(&client).await;

    let resp = client
        .get(format!("{}/auth/me", base_url()))
        .bearer_auth(&user.token)
        .send()
        .await
        .expect("me request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let me: Value = resp.json().await.expect("me body");
    assert_eq!(me["email"], user.email.as_str());
    assert_eq!(me["role"], "client");
    assert!(
        me.get("password_hash").is_none(),
        "password hash must never be serialized"
    );
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_email_rejected() {
    let client = Client::new();
    let user = register_and_login(&client).await;

    let resp = client
        .post(format!("{}/auth/register", base_url()))
        .json(&serde_json::json!({
            "email": user.email,
            "name": "Imposter",
            "password": "another password"
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_wrong_password_rejected() {
    let client = Client::new();
    let user = register_and_login(&client).await;

    let resp = client
        .post(format!("{}/auth/login", base_url()))
        .json(&serde_json::json!({ "email": user.email, "password": "wrong" }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_self_registration_cannot_grab_admin_role() {
    let client = Client::new();
    let email = format!("sneaky-{}@example.com", uuid::Uuid::new_v4());

    let resp = client
        .post(format!("{}/auth/register", base_url()))
        .json(&serde_json::json!({
            "email": email,
            "name": "Sneaky",
            "password": "long enough pw",
            "role": "admin"
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let user: Value = resp.json().await.expect("register body");
    assert_eq!(user["role"], "client");
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_catalog_is_public_but_writes_are_admin_only() {
    let client = Client::new();
    let base = base_url();

    let resp = client
        .get(format!("{base}/products"))
        .send()
        .await
        .expect("list request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    // Anonymous create is rejected.
    let resp = client
        .post(format!("{base}/products"))
        .json(&serde_json::json!({ "name": "X", "price": "1.00", "stock": 1 }))
        .send()
        .await
        .expect("create request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // A client token is rejected too.
    let user = register_and_login(&client).await;
    let resp = client
        .post(format!("{base}/products"))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({ "name": "X", "price": "1.00", "stock": 1 }))
        .send()
        .await
        .expect("create request failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server, database, and admin account"]
async fn test_order_decrements_stock_and_snapshots_price() {
    let client = Client::new();
    let base = base_url();
    let admin = admin_token(&client).await;
    let user = register_and_login(&client).await;

    let product = create_product(&client, &admin, "Order Flow Shirt", 5).await;
    let product_id = product["id"].as_str().expect("product id");

    let resp = client
        .post(format!("{base}/orders"))
        .bearer_auth(&user.token)
        .json(&order_payload(product_id, 2))
        .send()
        .await
        .expect("order request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order: Value = resp.json().await.expect("order body");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_amount"], "51.00");
    assert_eq!(order["lines"][0]["unit_price"], "25.50");
    assert_eq!(order["lines"][0]["quantity"], 2);

    let resp = client
        .get(format!("{base}/products/{product_id}"))
        .send()
        .await
        .expect("product request failed");
    let product: Value = resp.json().await.expect("product body");
    assert_eq!(product["stock"], 3);
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin account"]
async fn test_overdraw_rejected_and_stock_unchanged() {
    let client = Client::new();
    let base = base_url();
    let admin = admin_token(&client).await;
    let user = register_and_login(&client).await;

    let product = create_product(&client, &admin, "Scarce Shirt", 2).await;
    let product_id = product["id"].as_str().expect("product id");

    let resp = client
        .post(format!("{base}/orders"))
        .bearer_auth(&user.token)
        .json(&order_payload(product_id, 3))
        .send()
        .await
        .expect("order request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .get(format!("{base}/products/{product_id}"))
        .send()
        .await
        .expect("product request failed");
    let product: Value = resp.json().await.expect("product body");
    assert_eq!(product["stock"], 2, "failed order must not touch stock");
}

/// Two orders racing for the last unit: exactly one succeeds.
#[tokio::test]
#[ignore = "Requires running API server, database, and admin account"]
async fn test_concurrent_orders_for_last_unit() {
    let client = Client::new();
    let base = base_url();
    let admin = admin_token(&client).await;
    let alice = register_and_login(&client).await;
    let bob = register_and_login(&client).await;

    let product = create_product(&client, &admin, "Last Unit Shirt", 1).await;
    let product_id = product["id"].as_str().expect("product id").to_owned();

    let place = |token: String, product_id: String| {
        let client = client.clone();
        let base = base.clone();
        async move {
            client
                .post(format!("{base}/orders"))
                .bearer_auth(token)
                .json(&order_payload(&product_id, 1))
                .send()
                .await
                .expect("order request failed")
                .status()
        }
    };

    let (first, second) = tokio::join!(
        place(alice.token.clone(), product_id.clone()),
        place(bob.token.clone(), product_id.clone())
    );

    let successes = [first, second]
        .iter()
        .filter(|s| **s == StatusCode::CREATED)
        .count();
    assert_eq!(successes, 1, "exactly one racer may win ({first}, {second})");

    let resp = client
        .get(format!("{base}/products/{product_id}"))
        .send()
        .await
        .expect("product request failed");
    let product: Value = resp.json().await.expect("product body");
    assert_eq!(product["stock"], 0);
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin account"]
async fn test_order_visibility_rules() {
    let client = Client::new();
    let base = base_url();
    let admin = admin_token(&client).await;
    let alice = register_and_login(&client).await;
    let bob = register_and_login(&client).await;

    let product = create_product(&client, &admin, "Privacy Shirt", 5).await;
    let product_id = product["id"].as_str().expect("product id");

    let resp = client
        .post(format!("{base}/orders"))
        .bearer_auth(&alice.token)
        .json(&order_payload(product_id, 1))
        .send()
        .await
        .expect("order request failed");
    let order: Value = resp.json().await.expect("order body");
    let order_id = order["id"].as_str().expect("order id");

    // Bob cannot read Alice's order; an admin can.
    let resp = client
        .get(format!("{base}/orders/{order_id}"))
        .bearer_auth(&bob.token)
        .send()
        .await
        .expect("order get failed");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .get(format!("{base}/orders/{order_id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("order get failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin account"]
async fn test_status_update_rejects_unknown_value() {
    let client = Client::new();
    let base = base_url();
    let admin = admin_token(&client).await;
    let user = register_and_login(&client).await;

    let product = create_product(&client, &admin, "Status Shirt", 5).await;
    let product_id = product["id"].as_str().expect("product id");

    let resp = client
        .post(format!("{base}/orders"))
        .bearer_auth(&user.token)
        .json(&order_payload(product_id, 1))
        .send()
        .await
        .expect("order request failed");
    let order: Value = resp.json().await.expect("order body");
    let order_id = order["id"].as_str().expect("order id");

    let resp = client
        .put(format!("{base}/orders/{order_id}/status"))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "status": "refunded" }))
        .send()
        .await
        .expect("status update failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .put(format!("{base}/orders/{order_id}/status"))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "status": "shipped" }))
        .send()
        .await
        .expect("status update failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.expect("order body");
    assert_eq!(order["status"], "shipped");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_empty_cart_rejected() {
    let client = Client::new();
    let user = register_and_login(&client).await;

    let resp = client
        .post(format!("{}/orders", base_url()))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({
            "lines": [],
            "shipping": {
                "address": "1 Test Street",
                "city": "Lisbon",
                "postal_code": "1000-001",
                "country": "PT"
            }
        }))
        .send()
        .await
        .expect("order request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_health_endpoints() {
    let client = Client::new();
    let base = base_url();

    let resp = client
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("health request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base}/health/ready"))
        .send()
        .await
        .expect("readiness request failed");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_garbage_token_rejected() {
    let client = Client::new();

    let resp = client
        .get(format!("{}/auth/me", base_url()))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .expect("me request failed");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
