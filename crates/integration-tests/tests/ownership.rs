//! Owner checks across resources.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use executive_integration_tests::TestApp;

#[tokio::test]
async fn test_address_update_requires_owner() {
    let app = TestApp::new();
    let alice = app.sign_up("alice@example.com").await;
    let bob = app.sign_up("bob@example.com").await;
    let address_id = app.address(&alice).await;
    let uri = format!("/api/v1/address/{address_id}");
    let update = json!({"city": "Kisumu", "country": "KE", "zip_code": "40100"});

    let reply = app.call(Method::PUT, &uri, Some(&bob), Some(update.clone())).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app.call(Method::GET, "/api/v1/address", Some(&alice), None).await;
    assert_eq!(reply.body["city"], "Mombasa");

    let reply = app.call(Method::PUT, &uri, Some(&alice), Some(update)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["city"], "Kisumu");
}

#[tokio::test]
async fn test_orders_are_private() {
    let app = TestApp::new();
    let alice = app.sign_up("alice@example.com").await;
    let bob = app.sign_up("bob@example.com").await;
    let product = app.product(&alice, 1.0).await;
    app.address(&alice).await;
    let order = app.order(&alice, &product, 1, 1.0).await;
    let uri = format!("/api/v1/orders/{}", order["id"].as_str().unwrap());

    let reply = app.call(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app
        .call(Method::PATCH, &uri, Some(&bob), Some(json!({"status": "cancelled"})))
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app.call(Method::GET, "/api/v1/orders", Some(&bob), None).await;
    assert_eq!(reply.body, json!([]));

    let reply = app.call(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(reply.body["order"]["status"], "pending");
}

#[tokio::test]
async fn test_review_edit_by_author_only() {
    let app = TestApp::new();
    let alice = app.sign_up("alice@example.com").await;
    let bob = app.sign_up("bob@example.com").await;
    let product = app.product(&alice, 2.0).await;

    let reply = app
        .call(
            Method::POST,
            &format!("/api/v1/products/{product}/reviews"),
            Some(&alice),
            Some(json!({"rating": 5, "comment": "great"})),
        )
        .await;
    let uri = format!("/api/v1/reviews/{}", reply.body["id"].as_str().unwrap());

    let reply = app
        .call(Method::PUT, &uri, Some(&bob), Some(json!({"rating": 1})))
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app
        .call(Method::PUT, &uri, Some(&alice), Some(json!({"rating": 4, "comment": "good"})))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["rating"], 4);

    let reply = app
        .call(
            Method::GET,
            &format!("/api/v1/products/{product}/reviews"),
            Some(&bob),
            None,
        )
        .await;
    assert_eq!(reply.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let app = TestApp::new();
    let token = app.sign_up("ghost@example.com").await;
    let missing = uuid::Uuid::new_v4();

    for uri in [
        format!("/api/v1/orders/{missing}"),
        format!("/api/v1/reviews/{missing}"),
        format!("/api/v1/users/{missing}"),
        format!("/api/v1/products/{missing}"),
    ] {
        let reply = app.call(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{uri}");
    }

    let reply = app.call(Method::GET, "/api/v1/orders/not-a-uuid", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}
