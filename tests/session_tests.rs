use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use keydeck::api::AppState;
use keydeck::config::Config;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use tower::ServiceExt;

/// Seeded root operator (must match the initial migration)
const ROOT_USERNAME: &str = "root";
const ROOT_PASSWORD: &str = "keydeck-change-me";

async fn spawn_app() -> (Router, Arc<AppState>) {
    spawn_app_with(Config::default()).await
}

async fn spawn_app_with(mut config: Config) -> (Router, Arc<AppState>) {
    config.general.database_path = "sqlite::memory:".to_string();

    let state = keydeck::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let router = keydeck::api::router(state.clone()).await;
    (router, state)
}

async fn post_login(app: &Router, username: &str, password: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "username": username, "password": password }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get_me(app: &Router, token: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

async fn post_logout(app: &Router, token: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/logout")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_issued_token_is_accepted_until_revoked() {
    let (app, _state) = spawn_app().await;

    let (status, body) = post_login(&app, ROOT_USERNAME, ROOT_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["role"], "root");
    assert!(body["expires_at"].as_str().is_some());

    assert_eq!(get_me(&app, &token).await, StatusCode::OK);

    assert_eq!(post_logout(&app, &token).await, StatusCode::NO_CONTENT);
    assert_eq!(get_me(&app, &token).await, StatusCode::UNAUTHORIZED);

    // Revocation is idempotent
    assert_eq!(post_logout(&app, &token).await, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_validation_does_not_extend_expiry() {
    let (app, state) = spawn_app().await;

    let (_, body) = post_login(&app, ROOT_USERNAME, ROOT_PASSWORD).await;
    let token = body["token"].as_str().unwrap().to_string();

    let before = state
        .store()
        .find_session(&token)
        .await
        .unwrap()
        .expect("session missing");

    for _ in 0..3 {
        assert_eq!(get_me(&app, &token).await, StatusCode::OK);
    }

    let after = state
        .store()
        .find_session(&token)
        .await
        .unwrap()
        .expect("session missing");

    assert_eq!(before.expires_at, after.expires_at);
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let (app, state) = spawn_app().await;

    let root = state
        .store()
        .get_operator_by_username(ROOT_USERNAME)
        .await
        .unwrap()
        .expect("root operator missing");

    // Plant a session whose validity window has already closed
    let issued = chrono::Utc::now() - chrono::Duration::hours(3);
    let expired = chrono::Utc::now() - chrono::Duration::hours(1);

    let stale = keydeck::entities::sessions::ActiveModel {
        token: Set("deadbeef".repeat(8)),
        operator_id: Set(root.id),
        issued_at: Set(issued.to_rfc3339()),
        expires_at: Set(expired.to_rfc3339()),
        ..Default::default()
    };
    stale.insert(&state.store().conn).await.unwrap();

    let token = "deadbeef".repeat(8);
    assert_eq!(get_me(&app, &token).await, StatusCode::UNAUTHORIZED);

    // A live session issued through login still works
    let (_, body) = post_login(&app, ROOT_USERNAME, ROOT_PASSWORD).await;
    let live = body["token"].as_str().unwrap();
    assert_eq!(get_me(&app, live).await, StatusCode::OK);
}

#[tokio::test]
async fn test_login_lockout_after_repeated_failures() {
    let mut config = Config::default();
    config.security.auth_throttle.max_attempts = 3;
    config.security.auth_throttle.lockout_seconds = 60;
    let (app, _state) = spawn_app_with(config).await;

    for _ in 0..3 {
        let (status, _) = post_login(&app, ROOT_USERNAME, "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // Locked out now, even with the correct password
    let (status, _) = post_login(&app, ROOT_USERNAME, ROOT_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Other accounts are unaffected by the lockout
    let (status, _) = post_login(&app, "someone-else", "whatever").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_authorization_header_is_unauthenticated() {
    let (app, _state) = spawn_app().await;

    for header in ["Basic abc", "Bearer", "Bearer   ", "token-without-scheme"] {
        let status = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/me")
                    .header("Authorization", header)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status();
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header: {header}");
    }
}
