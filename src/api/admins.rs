use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::types::{AdminDto, AdminsResponse, CreateAdminRequest};
use super::{ApiError, AppState};

/// GET /api/admins
pub async fn list_admins(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminsResponse>, ApiError> {
    let admins = state.store().list_bot_admins().await?;

    Ok(Json(AdminsResponse {
        admins: admins.into_iter().map(AdminDto::from).collect(),
    }))
}

/// POST /api/admins
pub async fn create_admin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAdminRequest>,
) -> Result<Json<AdminDto>, ApiError> {
    if state
        .store()
        .get_bot_admin_by_telegram_id(payload.telegram_id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(format!(
            "Admin {} already exists",
            payload.telegram_id
        )));
    }

    let admin = state
        .store()
        .add_bot_admin(payload.telegram_id, payload.username.as_deref())
        .await?;

    Ok(Json(AdminDto::from(admin)))
}

/// DELETE /api/admins/{id}
/// The root admin record is refused here, loudly, so the caller learns
/// about the mistake instead of seeing a silent no-op.
pub async fn delete_admin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = state
        .store()
        .get_bot_admin(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin", id))?;

    if admin.is_root {
        return Err(ApiError::forbidden("The root admin cannot be removed"));
    }

    state.store().remove_bot_admin(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
