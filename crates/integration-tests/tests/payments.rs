//! Payment webhook reconciliation.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use executive_integration_tests::{TEST_NOTIFY_SECRET, TestApp};

async fn order_status(app: &TestApp, token: &str, order_id: &str) -> String {
    let reply = app
        .call(Method::GET, &format!("/api/v1/orders/{order_id}"), Some(token), None)
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.body["order"]["status"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_success_marks_order_paid() {
    let app = TestApp::new();
    let token = app.sign_up("buyer@example.com").await;
    let product = app.product(&token, 12.5).await;
    app.address(&token).await;
    let order = app.order(&token, &product, 3, 12.5).await;
    assert_eq!(order["total"], json!(37.5));
    let order_id = order["id"].as_str().unwrap();

    let reply = app
        .confirm_payment(
            TEST_NOTIFY_SECRET,
            json!({"order_id": order_id, "status": "success", "amount": "37.50", "provider": "mpesa"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(order_status(&app, &token, order_id).await, "paid");
    assert_eq!(app.store.payment_count(), 1);
}

#[tokio::test]
async fn test_non_success_records_payment_only() {
    let app = TestApp::new();
    let token = app.sign_up("failed@example.com").await;
    let product = app.product(&token, 5.0).await;
    app.address(&token).await;
    let order = app.order(&token, &product, 1, 5.0).await;
    let order_id = order["id"].as_str().unwrap();

    for status in ["failed", "pending", "cancelled"] {
        let reply = app
            .confirm_payment(
                TEST_NOTIFY_SECRET,
                json!({"order_id": order_id, "status": status, "amount": 5}),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{status}");
    }

    assert_eq!(order_status(&app, &token, order_id).await, "pending");
    assert_eq!(app.store.payment_count(), 3);
}

#[tokio::test]
async fn test_repeated_callback_inserts_again() {
    let app = TestApp::new();
    let token = app.sign_up("twice@example.com").await;
    let product = app.product(&token, 8.0).await;
    app.address(&token).await;
    let order = app.order(&token, &product, 1, 8.0).await;
    let body = json!({"order_id": order["id"], "status": "success", "amount": 8.0});

    for _ in 0..2 {
        let reply = app.confirm_payment(TEST_NOTIFY_SECRET, body.clone()).await;
        assert_eq!(reply.status, StatusCode::OK);
    }
    assert_eq!(app.store.payment_count(), 2);
}

#[tokio::test]
async fn test_mismatch_and_bad_secret_change_nothing() {
    let app = TestApp::new();
    let token = app.sign_up("mismatch@example.com").await;
    let product = app.product(&token, 10.0).await;
    app.address(&token).await;
    let order = app.order(&token, &product, 2, 10.0).await;
    let order_id = order["id"].as_str().unwrap();

    let reply = app
        .confirm_payment(
            TEST_NOTIFY_SECRET,
            json!({"order_id": order_id, "status": "success", "amount": 19.99}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = app
        .confirm_payment(
            "not-the-secret",
            json!({"order_id": order_id, "status": "success", "amount": 20}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    assert_eq!(order_status(&app, &token, order_id).await, "pending");
    assert_eq!(app.store.payment_count(), 0);
}
