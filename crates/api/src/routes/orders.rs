//! Order handlers.

use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use executive_core::OrderId;

use super::{Json, Path};
use crate::db::OrderStore;
use crate::error::{AppError, ErrorBody, Result};
use crate::middleware::CurrentUser;
use crate::models::{CreateOrderPayload, Order, OrderWithItems, UpdateOrderPayload};
use crate::services::CheckoutService;
use crate::state::AppState;

/// Load an order the caller owns.
async fn owned_order(state: &AppState, user: CurrentUser, id: OrderId) -> Result<Order> {
    let order = state
        .store()
        .order_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;
    if order.user_id != user.id {
        return Err(AppError::permission_denied());
    }
    Ok(order)
}

/// POST /api/v1/orders
///
/// # Errors
///
/// 400 for an invalid order, a missing address or an unknown product.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    operation_id = "create_order",
    tag = "orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 400, description = "Invalid order, missing address or unknown product", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CheckoutService::new(state.store())
        .place_order(user.id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/v1/orders
///
/// # Errors
///
/// 500 on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    operation_id = "list_orders",
    tag = "orders",
    responses(
        (status = 200, description = "Caller's orders", body = Vec<Order>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn index(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.store().orders_for_user(user.id).await?))
}

/// GET /api/v1/orders/{id}
///
/// # Errors
///
/// 404 for an unknown order, 403 if the caller does not own it.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    operation_id = "get_order",
    tag = "orders",
    params(("id" = OrderId, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with its items", body = OrderWithItems),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller does not own it", body = ErrorBody),
        (status = 404, description = "Unknown order", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithItems>> {
    let order = owned_order(&state, user, id).await?;
    let items = state.store().order_items_detailed(order.id).await?;
    Ok(Json(OrderWithItems { order, items }))
}

/// PATCH /api/v1/orders/{id}
///
/// Any of the five statuses may follow any other. This includes `paid`: the
/// owner can settle an order here without a payment record.
///
/// # Errors
///
/// 400 for an unknown status, 404/403 as for `show`.
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}",
    operation_id = "update_order",
    tag = "orders",
    params(("id" = OrderId, Path, description = "Order id")),
    request_body = UpdateOrderPayload,
    responses(
        (status = 200, description = "Status changed", body = Order),
        (status = 400, description = "Unknown status", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller does not own it", body = ErrorBody),
        (status = 404, description = "Unknown order", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<OrderId>,
    Json(payload): Json<UpdateOrderPayload>,
) -> Result<Json<Order>> {
    let status = payload.validate()?;
    let order = owned_order(&state, user, id).await?;

    let updated = state
        .store()
        .update_order_status(order.id, status, Utc::now())
        .await?;

    tracing::info!(order_id = %id, from = %order.status, to = %status, "Order status changed");
    Ok(Json(updated))
}
