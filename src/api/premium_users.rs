use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::types::{
    BulkDeletePremiumUsersRequest, CreatePremiumUserRequest, PremiumUserDto, PremiumUsersResponse,
};
use super::{ApiError, AppState};

/// GET /api/premium-users
pub async fn list_premium_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PremiumUsersResponse>, ApiError> {
    let users = state.store().list_premium_users().await?;

    Ok(Json(PremiumUsersResponse {
        users: users.into_iter().map(PremiumUserDto::from).collect(),
    }))
}

/// POST /api/premium-users
pub async fn create_premium_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePremiumUserRequest>,
) -> Result<Json<PremiumUserDto>, ApiError> {
    if state
        .store()
        .get_premium_user_by_telegram_id(payload.telegram_id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(format!(
            "Premium user {} already exists",
            payload.telegram_id
        )));
    }

    let user = state
        .store()
        .add_premium_user(
            payload.telegram_id,
            payload.username.as_deref(),
            payload.first_name.as_deref(),
        )
        .await?;

    Ok(Json(PremiumUserDto::from(user)))
}

/// DELETE /api/premium-users/{id}
pub async fn delete_premium_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.store().remove_premium_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/premium-users/bulk-delete
pub async fn bulk_delete_premium_users(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkDeletePremiumUsersRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.store().remove_premium_users(&payload.user_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
