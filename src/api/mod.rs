use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{
    CatalogService, InventoryService, SeaOrmCatalogService, SeaOrmInventoryService,
    SeaOrmSessionService, SessionService,
};
use crate::state::SharedState;

mod admins;
pub mod auth;
mod error;
mod keys;
mod observability;
mod premium_users;
mod products;
mod sellers;
mod types;
mod web_users;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub sessions: Arc<dyn SessionService>,

    pub catalog: Arc<dyn CatalogService>,

    pub inventory: Arc<dyn InventoryService>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let config = shared.config.read().await.clone();

    let sessions = Arc::new(SeaOrmSessionService::new(
        shared.store.clone(),
        config.session.clone(),
        config.security.auth_throttle.clone(),
    )) as Arc<dyn SessionService>;

    let catalog =
        Arc::new(SeaOrmCatalogService::new(shared.store.clone())) as Arc<dyn CatalogService>;

    let inventory =
        Arc::new(SeaOrmInventoryService::new(shared.store.clone())) as Arc<dyn InventoryService>;

    Ok(Arc::new(AppState {
        shared,
        sessions,
        catalog,
        inventory,
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .route("/health", get(health_check))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

/// Liveness probe; everything else requires a session.
async fn health_check() -> &'static str {
    "ok"
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(auth::get_current_operator))
        .route("/products", get(products::list_products))
        .route("/products", post(products::create_product))
        .route("/products/{id}/toggle", post(products::toggle_product))
        .route("/products/{id}", delete(products::delete_product))
        .route("/keys", get(keys::list_keys))
        .route("/keys/bulk", post(keys::bulk_add_keys))
        .route("/keys/claim", post(keys::claim_key))
        .route("/keys/bulk-delete", post(keys::bulk_delete_keys))
        .route(
            "/keys/delete-all/{product_id}",
            delete(keys::delete_all_keys),
        )
        .route(
            "/keys/delete-claimed/{product_id}",
            delete(keys::delete_claimed_keys),
        )
        .route("/admins", get(admins::list_admins))
        .route("/admins", post(admins::create_admin))
        .route("/admins/{id}", delete(admins::delete_admin))
        .route("/premium-users", get(premium_users::list_premium_users))
        .route("/premium-users", post(premium_users::create_premium_user))
        .route(
            "/premium-users/{id}",
            delete(premium_users::delete_premium_user),
        )
        .route(
            "/premium-users/bulk-delete",
            post(premium_users::bulk_delete_premium_users),
        )
        .route("/sellers", get(sellers::list_sellers))
        .route("/sellers", post(sellers::create_seller))
        .route("/sellers/{id}/toggle", post(sellers::toggle_seller))
        .route("/sellers/{id}", delete(sellers::delete_seller))
        .route("/web-users", get(web_users::list_web_users))
        .route("/web-users", post(web_users::create_web_user))
        .route("/web-users/{id}", delete(web_users::delete_web_user))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
