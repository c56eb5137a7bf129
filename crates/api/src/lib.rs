//! Executive commerce API.
//!
//! JSON REST service for a small shop: accounts, catalog, carts, orders,
//! reviews, addresses and payment reconciliation. The binary in `main.rs`
//! wires configuration, tracing, Sentry and `PostgreSQL` around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
#[cfg(any(test, feature = "memory-store"))]
pub mod testing;

use axum::{Router, extract::Request, middleware::from_fn, middleware::from_fn_with_state, routing::get};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::middleware::{rate_limit_middleware, request_id_middleware};
use crate::state::AppState;

/// Build the full HTTP application.
///
/// Everything under `/api/v1` except the payment webhook sits behind the
/// rate limiter. Health checks and the API docs are never limited.
pub fn app(state: AppState) -> Router {
    let api = routes::api_routes()
        .route_layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .merge(routes::webhook_routes());

    Router::new()
        .route("/health", get(routes::health))
        .route("/health/ready", get(routes::readiness))
        .nest("/api/v1", api)
        .merge(openapi::docs_routes())
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

// The query string is left out: it may carry a bearer token.
fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri().path(),
        request_id = tracing::field::Empty,
        user_id = tracing::field::Empty,
    )
}
