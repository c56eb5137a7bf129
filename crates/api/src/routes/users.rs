//! Registration, login and user profiles.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

use executive_core::UserId;

use super::{Json, Path};
use crate::db::UserStore;
use crate::error::{AppError, ErrorBody, Result};
use crate::middleware::CurrentUser;
use crate::models::{LoginPayload, RegisterPayload, User};
use crate::services::AuthService;
use crate::state::AppState;

/// Successful login.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /api/v1/register
///
/// # Errors
///
/// 400 for an invalid payload or an email that is already registered.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    operation_id = "register",
    tag = "users",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid payload or email taken", body = ErrorBody),
    ),
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<User>)> {
    let auth = AuthService::new(state.store(), state.tokens());
    let user = auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/login
///
/// # Errors
///
/// 401 when the email or password is wrong.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    operation_id = "login",
    tag = "users",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Bearer token issued", body = LoginResponse),
        (status = 401, description = "Wrong email or password", body = ErrorBody),
    ),
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.store(), state.tokens());
    let token = auth.login(&payload).await?;
    Ok(Json(LoginResponse { token }))
}

/// GET /api/v1/users/{id}
///
/// # Errors
///
/// 404 if no user has this id.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    operation_id = "get_user",
    tag = "users",
    params(("id" = UserId, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Unknown user", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn show(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    let user = state
        .store()
        .user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    Ok(Json(user))
}
