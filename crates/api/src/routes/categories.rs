//! Category handlers.

use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use executive_core::CategoryId;

use super::{Json, Path};
use crate::db::CategoryStore;
use crate::error::{AppError, ErrorBody, Result};
use crate::middleware::CatalogWriter;
use crate::models::{Category, CreateCategoryPayload};
use crate::state::AppState;

/// GET /api/v1/categories
///
/// # Errors
///
/// 500 on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    operation_id = "list_categories",
    tag = "catalog",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>),
    ),
)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.store().list_categories().await?))
}

/// POST /api/v1/categories
///
/// # Errors
///
/// 400 if the name is blank.
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    operation_id = "create_category",
    tag = "catalog",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Blank name", body = ErrorBody),
        (status = 403, description = "Not a catalog writer", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create(
    State(state): State<AppState>,
    CatalogWriter(writer): CatalogWriter,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = payload.into_category(Utc::now())?;
    state.store().create_category(&category).await?;

    tracing::info!(
        category_id = %category.id,
        actor = ?writer.map(|u| u.id),
        "Category created"
    );
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/v1/categories/{id}
///
/// # Errors
///
/// 404 if no category has this id.
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    operation_id = "get_category",
    tag = "catalog",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Unknown category", body = ErrorBody),
    ),
)]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    let category = state
        .store()
        .category_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("category not found".to_string()))?;
    Ok(Json(category))
}
