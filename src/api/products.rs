use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::types::{CreateProductRequest, ProductDto, ProductsResponse, ToggleActiveRequest};
use super::{ApiError, AppState};

/// GET /api/products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let products = state.catalog.list_products().await?;

    Ok(Json(ProductsResponse {
        products: products.into_iter().map(ProductDto::from).collect(),
    }))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state
        .catalog
        .create_product(&payload.name, payload.description.as_deref())
        .await?;

    // A new product has no keys yet; no point hitting the ledger
    Ok(Json(ProductDto {
        id: product.id,
        name: product.name,
        description: product.description,
        is_active: product.is_active,
        available_keys: 0,
        used_keys: 0,
        created_at: product.created_at,
    }))
}

/// POST /api/products/{id}/toggle
pub async fn toggle_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ToggleActiveRequest>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state.catalog.toggle_active(id, payload.is_active).await?;
    let stock = state.store().key_stock(id).await?;

    Ok(Json(ProductDto {
        id: product.id,
        name: product.name,
        description: product.description,
        is_active: product.is_active,
        available_keys: stock.available,
        used_keys: stock.used,
        created_at: product.created_at,
    }))
}

/// DELETE /api/products/{id}
/// Cascades to every key of the product.
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
