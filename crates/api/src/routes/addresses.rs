//! Address handlers.

use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use executive_core::AddressId;

use super::{Json, Path};
use crate::db::AddressStore;
use crate::error::{AppError, ErrorBody, Result};
use crate::middleware::CurrentUser;
use crate::models::{Address, AddressPayload};
use crate::state::AppState;

/// POST /api/v1/address
///
/// The new address becomes the caller's current one.
///
/// # Errors
///
/// 400 if city, country or zip code is blank.
#[utoipa::path(
    post,
    path = "/api/v1/address",
    operation_id = "create_address",
    tag = "addresses",
    request_body = AddressPayload,
    responses(
        (status = 201, description = "Address added", body = Address),
        (status = 400, description = "Blank city, country or zip code", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AddressPayload>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = payload.validate()?.into_address(user.id, Utc::now());
    state.store().create_address(&address).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// GET /api/v1/address
///
/// # Errors
///
/// 404 if the caller has no address on file.
#[utoipa::path(
    get,
    path = "/api/v1/address",
    operation_id = "current_address",
    tag = "addresses",
    responses(
        (status = 200, description = "Current address", body = Address),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "No address on file", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn current(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Address>> {
    let address = state
        .store()
        .current_address(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("no address on file".to_string()))?;
    Ok(Json(address))
}

/// PUT /api/v1/address/{id}
///
/// # Errors
///
/// 404 for an unknown address, 403 if it belongs to someone else.
#[utoipa::path(
    put,
    path = "/api/v1/address/{id}",
    operation_id = "update_address",
    tag = "addresses",
    params(("id" = AddressId, Path, description = "Address id")),
    request_body = AddressPayload,
    responses(
        (status = 200, description = "Address edited", body = Address),
        (status = 400, description = "Blank city, country or zip code", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller does not own it", body = ErrorBody),
        (status = 404, description = "Unknown address", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<AddressId>,
    Json(payload): Json<AddressPayload>,
) -> Result<Json<Address>> {
    let existing = state
        .store()
        .address_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("address not found".to_string()))?;
    if existing.user_id != user.id {
        return Err(AppError::permission_denied());
    }

    let address = payload.validate()?.apply_to(existing);
    state.store().update_address(&address).await?;
    Ok(Json(address))
}
