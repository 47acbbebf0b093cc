use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::CurrentOperator;
use super::types::{CreateWebUserRequest, OperatorDto, WebUsersResponse};
use super::{ApiError, AppState};
use crate::db::OperatorRole;

/// GET /api/web-users
pub async fn list_web_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WebUsersResponse>, ApiError> {
    let operators = state.store().list_operators().await?;

    Ok(Json(WebUsersResponse {
        users: operators.into_iter().map(OperatorDto::from).collect(),
    }))
}

/// POST /api/web-users
/// Managing panel accounts is root-only.
pub async fn create_web_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentOperator>,
    Json(payload): Json<CreateWebUserRequest>,
) -> Result<Json<OperatorDto>, ApiError> {
    current.require_root()?;

    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    if state
        .store()
        .get_operator_by_username(username)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(format!(
            "Operator '{username}' already exists"
        )));
    }

    let security = state.config().read().await.security.clone();

    let operator = state
        .store()
        .create_operator(username, &payload.password, OperatorRole::Admin, &security)
        .await?;

    Ok(Json(OperatorDto::from(operator)))
}

/// DELETE /api/web-users/{id}
/// Root-only, and the root operator itself is never deletable — the
/// distinguished record fails closed with 403 for every caller.
pub async fn delete_web_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentOperator>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    current.require_root()?;

    let operator = state
        .store()
        .get_operator(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Operator", id))?;

    if operator.role.is_root() {
        return Err(ApiError::forbidden("The root operator cannot be removed"));
    }

    state.store().delete_operator(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
