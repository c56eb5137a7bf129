//! Integration tests for Executive.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (in-memory store)
//! cargo test -p executive-integration-tests
//!
//! # Live-server and Redis tests
//! EXECUTIVE_API_URL=http://localhost:8080 cargo test -p executive-integration-tests -- --ignored
//!
//! # PgStore tests (migrations are applied on connect)
//! DATABASE_URL=postgres://localhost/executive_test \
//!     cargo test -p executive-integration-tests --test postgres_store -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `rate_limiting` - Limiter behaviour under concurrency
//! - `payments` - Webhook reconciliation
//! - `ownership` - Owner checks across resources
//! - `live_server` - Smoke tests against a running server (ignored)
//! - `postgres_store` - `PgStore` transactions and exact money (ignored)

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use executive_api::config::ApiConfig;
use executive_api::db::MemoryStore;
use executive_api::middleware::auth::NOTIFY_SECRET_HEADER;
pub use executive_api::testing::{TEST_NOTIFY_SECRET, test_config};

/// The application over a fresh in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

/// Status and parsed JSON body of a response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    #[must_use]
    pub fn with_config(config: ApiConfig) -> Self {
        let (router, store) = executive_api::testing::test_app(config);
        Self { router, store }
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Reply { status, body }
    }

    /// Send a request as the holder of `token` (or anonymously).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// POST a payment callback with the given shared secret.
    pub async fn confirm_payment(&self, secret: &str, body: Value) -> Reply {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/payments/confirm")
            .header(NOTIFY_SECRET_HEADER, secret)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Register and log in; returns the bearer token.
    pub async fn sign_up(&self, email: &str) -> String {
        let reply = self
            .call(
                Method::POST,
                "/api/v1/register",
                None,
                Some(json!({"name": "Test User", "email": email, "password": "correct-horse"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);

        let reply = self
            .call(
                Method::POST,
                "/api/v1/login",
                None,
                Some(json!({"email": email, "password": "correct-horse"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.body);
        reply.body["token"].as_str().unwrap().to_owned()
    }

    /// Create a category with one product priced `price`; returns the product id.
    pub async fn product(&self, token: &str, price: f64) -> String {
        let reply = self
            .call(
                Method::POST,
                "/api/v1/categories",
                Some(token),
                Some(json!({"name": "Hardware"})),
            )
            .await;
        let category_id = reply.body["id"].as_str().unwrap().to_owned();

        let reply = self
            .call(
                Method::POST,
                "/api/v1/products",
                Some(token),
                Some(json!({
                    "name": "Lamp",
                    "price": price,
                    "category_id": category_id,
                    "quantity": 3
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
        reply.body["id"].as_str().unwrap().to_owned()
    }

    /// Put an address on file; returns its id.
    pub async fn address(&self, token: &str) -> String {
        let reply = self
            .call(
                Method::POST,
                "/api/v1/address",
                Some(token),
                Some(json!({"city": "Mombasa", "country": "KE", "zip_code": "80100"})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
        reply.body["id"].as_str().unwrap().to_owned()
    }

    /// Place a one-line order; returns the order body.
    pub async fn order(&self, token: &str, product_id: &str, quantity: i32, price: f64) -> Value {
        let reply = self
            .call(
                Method::POST,
                "/api/v1/orders",
                Some(token),
                Some(json!({"items": [{"product_id": product_id, "quantity": quantity, "price": price}]})),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
        reply.body
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
