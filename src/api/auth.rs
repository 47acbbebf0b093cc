use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use super::types::{LoginRequest, LoginResponse, OperatorDto};
use crate::db::OperatorRole;

// ============================================================================
// Typed session handle
// ============================================================================

/// The operator resolved for the current request. Inserted into request
/// extensions by the guard; handlers read this instead of the raw token.
#[derive(Debug, Clone)]
pub struct CurrentOperator {
    pub id: i32,
    pub username: String,
    pub role: OperatorRole,
}

impl CurrentOperator {
    /// Root-only operations call this before touching anything.
    pub fn require_root(&self) -> Result<(), ApiError> {
        if self.role.is_root() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Root operator required"))
        }
    }
}

// ============================================================================
// Middleware (Access Guard)
// ============================================================================

/// Authorization boundary for every protected route: extract the bearer
/// token, resolve it through the session service, attach the operator.
/// Never looks at request bodies.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Err(ApiError::unauthenticated("Missing bearer token"));
    };

    let operator = state.sessions.validate(&token).await?;

    tracing::Span::current().record("user_id", operator.username.as_str());

    request.extensions_mut().insert(CurrentOperator {
        id: operator.id,
        username: operator.username,
        role: operator.role,
    });

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/login
/// Authenticate with username and password, returns a fresh bearer session
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let issued = state
        .sessions
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        token: issued.session.token,
        expires_at: issued.session.expires_at,
        username: issued.operator.username,
        role: issued.operator.role.as_str().to_string(),
    }))
}

/// POST /api/logout
/// Revoke the presented token. Idempotent: an absent, unknown or expired
/// token still yields 204.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_bearer_token(&headers) {
        state.sessions.revoke(&token).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/me
/// The operator behind the current session
pub async fn get_current_operator(
    State(state): State<Arc<AppState>>,
    axum::Extension(current): axum::Extension<CurrentOperator>,
) -> Result<Json<OperatorDto>, ApiError> {
    let operator = state
        .store()
        .get_operator(current.id)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Operator no longer exists"))?;

    Ok(Json(OperatorDto::from(operator)))
}
