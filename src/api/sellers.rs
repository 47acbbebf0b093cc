use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::types::{CreateSellerRequest, SellerDto, SellersResponse, ToggleActiveRequest};
use super::{ApiError, AppState};

/// GET /api/sellers
pub async fn list_sellers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SellersResponse>, ApiError> {
    let sellers = state.store().list_sellers().await?;

    Ok(Json(SellersResponse {
        sellers: sellers.into_iter().map(SellerDto::from).collect(),
    }))
}

/// POST /api/sellers
pub async fn create_seller(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSellerRequest>,
) -> Result<Json<SellerDto>, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("Seller username is required"));
    }

    let seller = state
        .store()
        .add_seller(
            username,
            payload.name.as_deref(),
            payload.country.as_deref(),
            payload.platforms.as_deref(),
        )
        .await?;

    Ok(Json(SellerDto::from(seller)))
}

/// POST /api/sellers/{id}/toggle
pub async fn toggle_seller(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ToggleActiveRequest>,
) -> Result<Json<SellerDto>, ApiError> {
    let seller = state
        .store()
        .set_seller_active(id, payload.is_active)
        .await?
        .ok_or_else(|| ApiError::not_found("Seller", id))?;

    Ok(Json(SellerDto::from(seller)))
}

/// DELETE /api/sellers/{id}
pub async fn delete_seller(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.store().remove_seller(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
