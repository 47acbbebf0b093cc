use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::types::{
    BulkAddKeysRequest, BulkAddKeysResponse, BulkDeleteKeysRequest, ClaimKeyRequest,
    ClaimKeyResponse, ClaimedKeyDto, KeyDto, KeysResponse, ListKeysQuery,
};
use super::{ApiError, AppState};

/// GET /api/keys?product_id=
/// Without `product_id`, lists the whole ledger.
pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListKeysQuery>,
) -> Result<Json<KeysResponse>, ApiError> {
    let keys = state.inventory.list_keys(query.product_id).await?;

    let product_names: HashMap<i32, String> = state
        .store()
        .list_products()
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let keys = keys
        .into_iter()
        .map(|key| {
            let name = product_names
                .get(&key.product_id)
                .cloned()
                .unwrap_or_default();
            KeyDto::from_record(key, name)
        })
        .collect();

    Ok(Json(KeysResponse { keys }))
}

/// POST /api/keys/bulk
/// Imports `<duration> <value>` lines; bad lines are rejected individually
/// and reported back verbatim.
pub async fn bulk_add_keys(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkAddKeysRequest>,
) -> Result<Json<BulkAddKeysResponse>, ApiError> {
    let outcome = state
        .inventory
        .bulk_insert(payload.product_id, &payload.keys)
        .await?;

    Ok(Json(BulkAddKeysResponse {
        inserted_count: outcome.inserted_count,
        rejected_lines: outcome.rejected_lines,
    }))
}

/// POST /api/keys/claim
/// Hands out one available key, exactly once. `key` is null on exhaustion.
pub async fn claim_key(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ClaimKeyRequest>,
) -> Result<Json<ClaimKeyResponse>, ApiError> {
    let claimed = state
        .inventory
        .claim(payload.product_id, payload.duration.as_deref())
        .await?;

    Ok(Json(ClaimKeyResponse {
        key: claimed.map(ClaimedKeyDto::from),
    }))
}

/// POST /api/keys/bulk-delete
/// Unknown ids are skipped; deletion is idempotent.
pub async fn bulk_delete_keys(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BulkDeleteKeysRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.inventory.bulk_delete(&payload.key_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/keys/delete-all/{product_id}
pub async fn delete_all_keys(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.inventory.delete_all_for_product(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/keys/delete-claimed/{product_id}
pub async fn delete_claimed_keys(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .inventory
        .delete_claimed_for_product(product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
