//! Cart handlers.

use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use executive_core::{CartId, CartItemId, ProductId};

use super::{Json, Path};
use crate::db::CartStore;
use crate::error::{AppError, ErrorBody, Result};
use crate::middleware::CurrentUser;
use crate::models::{AddToCartPayload, Cart, CartItem};
use crate::state::AppState;

/// POST /api/v1/products/{id}/cart
///
/// Creates the caller's cart on first use.
///
/// # Errors
///
/// 400 for a quantity below 1 or an unknown product.
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/cart",
    operation_id = "add_to_cart",
    tag = "cart",
    params(("id" = ProductId, Path, description = "Product id")),
    request_body = AddToCartPayload,
    responses(
        (status = 201, description = "Line added", body = CartItem),
        (status = 400, description = "Quantity below 1 or unknown product", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<ProductId>,
    Json(payload): Json<AddToCartPayload>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let quantity = payload.validate()?;
    let now = Utc::now();

    let cart = state
        .store()
        .ensure_cart(&Cart {
            id: CartId::generate(),
            user_id: user.id,
            created_at: now,
        })
        .await?;

    let item = CartItem {
        id: CartItemId::generate(),
        cart_id: cart.id,
        product_id,
        quantity,
        created_at: now,
    };
    state.store().add_cart_item(&item).await?;

    tracing::debug!(cart_id = %cart.id, product_id = %product_id, quantity, "Added to cart");
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/v1/cart/my/items
///
/// # Errors
///
/// 404 if the caller has never added anything.
#[utoipa::path(
    get,
    path = "/api/v1/cart/my/items",
    operation_id = "cart_items",
    tag = "cart",
    responses(
        (status = 200, description = "Caller's cart lines", body = Vec<CartItem>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No cart yet", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn items(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<CartItem>>> {
    let cart = state
        .store()
        .cart_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("cart not found".to_string()))?;
    Ok(Json(state.store().cart_items(cart.id).await?))
}
