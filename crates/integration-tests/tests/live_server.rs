//! Smoke tests against a running API server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`exec-cli migrate`)
//! - The API server running (`cargo run -p executive-api`)
//!
//! Run with: `cargo test -p executive-integration-tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
fn api_base_url() -> String {
    std::env::var("EXECUTIVE_API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_health() {
    let resp = Client::new()
        .get(format!("{}/health", api_base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = Client::new()
        .get(format!("{}/health/ready", api_base_url()))
        .send()
        .await
        .expect("Failed to reach server");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_register_login_and_list_orders() {
    let client = Client::new();
    let base_url = api_base_url();
    let email = format!("smoke-{}@example.com", Uuid::new_v4().simple());

    let resp = client
        .post(format!("{base_url}/api/v1/register"))
        .json(&json!({"name": "Smoke", "email": email, "password": "smoke-test-pw"}))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: Value = resp.json().await.expect("Invalid register body");
    assert!(user.get("password_hash").is_none());

    let resp = client
        .post(format!("{base_url}/api/v1/login"))
        .json(&json!({"email": email, "password": "smoke-test-pw"}))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Invalid login body");
    let token = body["token"].as_str().expect("No token in login body");

    let resp = client
        .get(format!("{base_url}/api/v1/orders"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);
    let orders: Value = resp.json().await.expect("Invalid orders body");
    assert_eq!(orders, json!([]));
}
