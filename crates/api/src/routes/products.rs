//! Product handlers.

use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use executive_core::{CategoryId, ProductId};

use super::{Json, Path};
use crate::db::{CategoryStore, ProductStore};
use crate::error::{AppError, ErrorBody, Result};
use crate::middleware::CatalogWriter;
use crate::models::{Product, ProductPayload};
use crate::state::AppState;

async fn require_category(state: &AppState, id: CategoryId) -> Result<()> {
    if state.store().category_by_id(id).await?.is_none() {
        return Err(AppError::BadRequest("category does not exist".to_string()));
    }
    Ok(())
}

async fn find_product(state: &AppState, id: ProductId) -> Result<Product> {
    state
        .store()
        .product_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_string()))
}

/// GET /api/v1/products
///
/// # Errors
///
/// 500 on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    operation_id = "list_products",
    tag = "catalog",
    responses(
        (status = 200, description = "All products", body = Vec<Product>),
    ),
)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.store().list_products().await?))
}

/// POST /api/v1/products
///
/// # Errors
///
/// 400 for an invalid payload or an unknown category.
#[utoipa::path(
    post,
    path = "/api/v1/products",
    operation_id = "create_product",
    tag = "catalog",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid payload or unknown category", body = ErrorBody),
        (status = 403, description = "Not a catalog writer", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create(
    State(state): State<AppState>,
    CatalogWriter(writer): CatalogWriter,
    Json(payload): Json<ProductPayload>,
) -> Result<(StatusCode, Json<Product>)> {
    let fields = payload.validate()?;
    require_category(&state, fields.category_id).await?;

    let product = fields.into_new_product(Utc::now());
    state.store().create_product(&product).await?;

    tracing::info!(
        product_id = %product.id,
        actor = ?writer.map(|u| u.id),
        "Product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/v1/products/{id}
///
/// # Errors
///
/// 404 if no product has this id.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    operation_id = "get_product",
    tag = "catalog",
    params(("id" = ProductId, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Unknown product", body = ErrorBody),
    ),
)]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(find_product(&state, id).await?))
}

/// PUT /api/v1/products/{id}
///
/// # Errors
///
/// 404 for an unknown product, 400 for an invalid payload or category.
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    operation_id = "update_product",
    tag = "catalog",
    params(("id" = ProductId, Path, description = "Product id")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Product replaced", body = Product),
        (status = 400, description = "Invalid payload or unknown category", body = ErrorBody),
        (status = 403, description = "Not a catalog writer", body = ErrorBody),
        (status = 404, description = "Unknown product", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn update(
    State(state): State<AppState>,
    CatalogWriter(writer): CatalogWriter,
    Path(id): Path<ProductId>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>> {
    let existing = find_product(&state, id).await?;
    let fields = payload.validate()?;
    require_category(&state, fields.category_id).await?;

    let product = fields.apply_to(existing, Utc::now());
    state.store().update_product(&product).await?;

    tracing::info!(
        product_id = %product.id,
        actor = ?writer.map(|u| u.id),
        "Product updated"
    );
    Ok(Json(product))
}

/// DELETE /api/v1/products/{id}
///
/// # Errors
///
/// 404 for an unknown product, 400 if orders still reference it.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    operation_id = "delete_product",
    tag = "catalog",
    params(("id" = ProductId, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, description = "Orders still reference it", body = ErrorBody),
        (status = 403, description = "Not a catalog writer", body = ErrorBody),
        (status = 404, description = "Unknown product", body = ErrorBody),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn delete(
    State(state): State<AppState>,
    CatalogWriter(writer): CatalogWriter,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.store().delete_product(id).await?;

    tracing::info!(product_id = %id, actor = ?writer.map(|u| u.id), "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
