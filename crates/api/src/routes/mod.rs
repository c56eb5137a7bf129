//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Liveness
//! GET    /health/ready                   - Readiness (store ping)
//!
//! # /api/v1 (rate limited)
//! POST   /register                       - Create account
//! POST   /login                          - Issue bearer token
//! GET    /users/{id}                     - User profile            (auth)
//! GET    /categories                     - List categories
//! POST   /categories                     - Create category         (catalog writer)
//! GET    /categories/{id}                - Category detail
//! GET    /products                       - List products
//! POST   /products                       - Create product          (catalog writer)
//! GET    /products/{id}                  - Product detail
//! PUT    /products/{id}                  - Replace product         (catalog writer)
//! DELETE /products/{id}                  - Delete product          (catalog writer)
//! POST   /products/{id}/cart             - Add to cart             (auth)
//! GET    /cart/my/items                  - Caller's cart lines     (auth)
//! POST   /orders                         - Place order             (auth)
//! GET    /orders                         - Caller's orders         (auth)
//! GET    /orders/{id}                    - Order with items        (owner)
//! PATCH  /orders/{id}                    - Change status           (owner)
//! POST   /products/{id}/reviews          - Review a product        (auth)
//! GET    /products/{id}/reviews          - Product reviews         (auth)
//! GET    /reviews/{id}                   - Review detail           (auth)
//! PUT    /reviews/{id}                   - Edit review             (owner)
//! DELETE /reviews/{id}                   - Delete review           (owner)
//! POST   /address                        - Add address             (auth)
//! GET    /address                        - Current address         (auth)
//! PUT    /address/{id}                   - Edit address            (owner)
//!
//! # /api/v1 (payment bridge, shared secret, not rate limited)
//! POST   /payments/confirm               - Provider callback
//! GET    /payments/checkout/{id}         - Payment by checkout request id
//!
//! # Documentation (not rate limited)
//! GET    /api-docs/openapi.json          - OpenAPI 3.1 document
//! GET    /swagger/                       - Swagger UI
//! ```

pub mod addresses;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor and response whose rejections use the API error shape.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path extractor whose rejections use the API error shape.
#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Routes behind the rate limiter.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/users/{id}", get(users::show))
        .route("/categories", get(categories::index).post(categories::create))
        .route("/categories/{id}", get(categories::show))
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/cart", post(cart::add))
        .route(
            "/products/{id}/reviews",
            get(reviews::index).post(reviews::create),
        )
        .route("/cart/my/items", get(cart::items))
        .route("/orders", get(orders::index).post(orders::create))
        .route("/orders/{id}", get(orders::show).patch(orders::update))
        .route(
            "/reviews/{id}",
            get(reviews::show).put(reviews::update).delete(reviews::delete),
        )
        .route("/address", get(addresses::current).post(addresses::create))
        .route("/address/{id}", put(addresses::update))
}

/// Payment bridge callbacks.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/confirm", post(payments::confirm))
        .route(
            "/payments/checkout/{checkout_request_id}",
            get(payments::by_checkout_id),
        )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
#[utoipa::path(
    get,
    path = "/health",
    operation_id = "health",
    tag = "health",
    responses((status = 200, description = "Server is running", body = String)),
)]
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
#[utoipa::path(
    get,
    path = "/health/ready",
    operation_id = "readiness",
    tag = "health",
    responses(
        (status = 200, description = "Store reachable"),
        (status = 503, description = "Store unreachable"),
    ),
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
