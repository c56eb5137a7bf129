//! Review handlers.

use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use executive_core::{ProductId, ReviewId};

use super::{Json, Path};
use crate::db::ReviewStore;
use crate::error::{AppError, ErrorBody, Result};
use crate::middleware::CurrentUser;
use crate::models::{Review, ReviewPayload};
use crate::state::AppState;

async fn find_review(state: &AppState, id: ReviewId) -> Result<Review> {
    state
        .store()
        .review_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("review not found".to_string()))
}

async fn owned_review(state: &AppState, user: CurrentUser, id: ReviewId) -> Result<Review> {
    let review = find_review(state, id).await?;
    if review.user_id != user.id {
        return Err(AppError::permission_denied());
    }
    Ok(review)
}

/// POST /api/v1/products/{id}/reviews
///
/// # Errors
///
/// 400 for a rating outside 1..=5 or an unknown product.
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/reviews",
    operation_id = "create_review",
    tag = "reviews",
    params(("id" = ProductId, Path, description = "Product id")),
    request_body = ReviewPayload,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Rating outside 1..=5 or unknown product", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<ProductId>,
    Json(payload): Json<ReviewPayload>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = payload.into_review(product_id, user.id, Utc::now());
    state.store().create_review(&review).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/v1/products/{id}/reviews
///
/// # Errors
///
/// 500 on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/reviews",
    operation_id = "list_reviews",
    tag = "reviews",
    params(("id" = ProductId, Path, description = "Product id")),
    responses(
        (status = 200, description = "Reviews of the product", body = Vec<Review>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn index(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(state.store().reviews_for_product(product_id).await?))
}

/// GET /api/v1/reviews/{id}
///
/// # Errors
///
/// 404 if no review has this id.
#[utoipa::path(
    get,
    path = "/api/v1/reviews/{id}",
    operation_id = "get_review",
    tag = "reviews",
    params(("id" = ReviewId, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review", body = Review),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Unknown review", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn show(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<ReviewId>,
) -> Result<Json<Review>> {
    Ok(Json(find_review(&state, id).await?))
}

/// PUT /api/v1/reviews/{id}
///
/// # Errors
///
/// 404 for an unknown review, 403 if the caller did not write it.
#[utoipa::path(
    put,
    path = "/api/v1/reviews/{id}",
    operation_id = "update_review",
    tag = "reviews",
    params(("id" = ReviewId, Path, description = "Review id")),
    request_body = ReviewPayload,
    responses(
        (status = 200, description = "Review edited", body = Review),
        (status = 400, description = "Rating outside 1..=5", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller does not own it", body = ErrorBody),
        (status = 404, description = "Unknown review", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ReviewId>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<Review>> {
    let existing = owned_review(&state, user, id).await?;
    let review = payload.apply_to(existing, Utc::now());
    state.store().update_review(&review).await?;
    Ok(Json(review))
}

/// DELETE /api/v1/reviews/{id}
///
/// # Errors
///
/// 404 for an unknown review, 403 if the caller did not write it.
#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{id}",
    operation_id = "delete_review",
    tag = "reviews",
    params(("id" = ReviewId, Path, description = "Review id")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller does not own it", body = ErrorBody),
        (status = 404, description = "Unknown review", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode> {
    owned_review(&state, user, id).await?;
    state.store().delete_review(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
