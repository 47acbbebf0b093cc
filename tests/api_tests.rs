use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use keydeck::config::Config;
use tower::ServiceExt;

/// Seeded root operator (must match the initial migration)
const ROOT_USERNAME: &str = "root";
const ROOT_PASSWORD: &str = "keydeck-change-me";

async fn spawn_app() -> Router {
    spawn_app_with(Config::default()).await
}

async fn spawn_app_with(mut config: Config) -> Router {
    config.general.database_path = "sqlite::memory:".to_string();

    let state = keydeck::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    keydeck::api::router(state).await
}

async fn login(app: &Router) -> String {
    login_as(app, ROOT_USERNAME, ROOT_PASSWORD)
        .await
        .expect("root login failed")
}

async fn login_as(app: &Router, username: &str, password: &str) -> Option<String> {
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

    if response.status() != StatusCode::OK {
        return None;
    }

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    Some(json["token"].as_str().unwrap().to_string())
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = if let Some(body) = body {
        builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = spawn_app().await;

    let (status, _) = request(&app, "GET", "/api/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, "GET", "/api/products", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Health probe stays open
    let (status, _) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = spawn_app().await;

    assert!(login_as(&app, ROOT_USERNAME, "wrong-password").await.is_none());
    assert!(login_as(&app, "nobody", "whatever").await.is_none());
    assert!(login_as(&app, ROOT_USERNAME, ROOT_PASSWORD).await.is_some());
}

#[tokio::test]
async fn test_products_crud() {
    let app = spawn_app().await;
    let token = login(&app).await;

    // Empty name is rejected
    let (status, _) = request(
        &app,
        "POST",
        "/api/products",
        Some(&token),
        Some(serde_json::json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, product) = request(
        &app,
        "POST",
        "/api/products",
        Some(&token),
        Some(serde_json::json!({ "name": "Aim Trainer", "description": "desc" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["name"], "Aim Trainer");
    assert_eq!(product["is_active"], true);
    let id = product["id"].as_i64().unwrap();

    let (status, list) = request(&app, "GET", "/api/products", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["products"].as_array().unwrap().len(), 1);

    // Toggle off, then toggle off again: second call is an idempotent success
    let (status, toggled) = request(
        &app,
        "POST",
        &format!("/api/products/{id}/toggle"),
        Some(&token),
        Some(serde_json::json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_active"], false);

    let (status, toggled) = request(
        &app,
        "POST",
        &format!("/api/products/{id}/toggle"),
        Some(&token),
        Some(serde_json::json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_active"], false);

    // Unknown id is a 404
    let (status, _) = request(
        &app,
        "POST",
        "/api/products/9999/toggle",
        Some(&token),
        Some(serde_json::json!({ "is_active": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/products/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/products/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_insert_reports_rejections() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let (_, product) = request(
        &app,
        "POST",
        "/api/products",
        Some(&token),
        Some(serde_json::json!({ "name": "Sniper" })),
    )
    .await;
    let id = product["id"].as_i64().unwrap();

    let (status, outcome) = request(
        &app,
        "POST",
        "/api/keys/bulk",
        Some(&token),
        Some(serde_json::json!({ "product_id": id, "keys": "1d ABC\n1d ABC\n7d XYZ" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["inserted_count"], 2);
    let rejected = outcome["rejected_lines"].as_array().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["line"], "1d ABC");
    assert_eq!(rejected[0]["reason"], "duplicate_in_batch");

    // Counts are derived from the ledger
    let (_, list) = request(&app, "GET", "/api/products", Some(&token), None).await;
    assert_eq!(list["products"][0]["available_keys"], 2);
    assert_eq!(list["products"][0]["used_keys"], 0);

    // Re-importing an existing value is rejected against the stored keys
    let (_, outcome) = request(
        &app,
        "POST",
        "/api/keys/bulk",
        Some(&token),
        Some(serde_json::json!({ "product_id": id, "keys": "1m ABC" })),
    )
    .await;
    assert_eq!(outcome["inserted_count"], 0);
    assert_eq!(outcome["rejected_lines"][0]["reason"], "already_exists");

    // All-invalid input is a 200 with everything rejected, not a failure
    let (status, outcome) = request(
        &app,
        "POST",
        "/api/keys/bulk",
        Some(&token),
        Some(serde_json::json!({ "product_id": id, "keys": "nope\nbad line" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["inserted_count"], 0);
    assert_eq!(outcome["rejected_lines"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_bulk_insert_unknown_product() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/keys/bulk",
        Some(&token),
        Some(serde_json::json!({ "product_id": 42, "keys": "1d ABC" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_keys_listing_carries_product_names() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let (_, product) = request(
        &app,
        "POST",
        "/api/products",
        Some(&token),
        Some(serde_json::json!({ "name": "Rage" })),
    )
    .await;
    let id = product["id"].as_i64().unwrap();

    request(
        &app,
        "POST",
        "/api/keys/bulk",
        Some(&token),
        Some(serde_json::json!({ "product_id": id, "keys": "1d K1\n7d K2" })),
    )
    .await;

    let (status, list) = request(
        &app,
        "GET",
        &format!("/api/keys?product_id={id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let keys = list["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|k| k["product_name"] == "Rage"));
    assert!(keys.iter().all(|k| k["is_claimed"] == false));

    // Unfiltered listing covers the whole ledger
    let (_, all) = request(&app, "GET", "/api/keys", Some(&token), None).await;
    assert_eq!(all["keys"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_claim_endpoint_hands_out_keys_until_exhausted() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let (_, product) = request(
        &app,
        "POST",
        "/api/products",
        Some(&token),
        Some(serde_json::json!({ "name": "Spoofer" })),
    )
    .await;
    let id = product["id"].as_i64().unwrap();

    request(
        &app,
        "POST",
        "/api/keys/bulk",
        Some(&token),
        Some(serde_json::json!({ "product_id": id, "keys": "1d ONLY-ONE" })),
    )
    .await;

    let (status, claimed) = request(
        &app,
        "POST",
        "/api/keys/claim",
        Some(&token),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["key"]["key_value"], "ONLY-ONE");

    // Exhaustion is a null key, not an error
    let (status, claimed) = request(
        &app,
        "POST",
        "/api/keys/claim",
        Some(&token),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(claimed["key"].is_null());

    // The ledger reflects the claim in its derived counts
    let (_, list) = request(&app, "GET", "/api/products", Some(&token), None).await;
    assert_eq!(list["products"][0]["available_keys"], 0);
    assert_eq!(list["products"][0]["used_keys"], 1);
}

#[tokio::test]
async fn test_bot_admins_root_protection() {
    let mut config = Config::default();
    config.general.root_admin_telegram_id = Some(999);
    let app = spawn_app_with(config).await;
    let token = login(&app).await;

    let (_, list) = request(&app, "GET", "/api/admins", Some(&token), None).await;
    let admins = list["admins"].as_array().unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0]["is_root"], true);
    let root_id = admins[0]["id"].as_i64().unwrap();

    // Deleting the root record is refused loudly, not silently skipped
    let (status, body) = request(
        &app,
        "DELETE",
        &format!("/api/admins/{root_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("root"));

    let (status, admin) = request(
        &app,
        "POST",
        "/api/admins",
        Some(&token),
        Some(serde_json::json!({ "telegram_id": 123, "username": "helper" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin_id = admin["id"].as_i64().unwrap();

    // Duplicate telegram id conflicts
    let (status, _) = request(
        &app,
        "POST",
        "/api/admins",
        Some(&token),
        Some(serde_json::json!({ "telegram_id": 123 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/admins/{admin_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Root row is still there
    let (_, list) = request(&app, "GET", "/api/admins", Some(&token), None).await;
    assert_eq!(list["admins"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_premium_users_crud_and_bulk_delete() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let mut ids = Vec::new();
    for telegram_id in [1001, 1002, 1003] {
        let (status, user) = request(
            &app,
            "POST",
            "/api/premium-users",
            Some(&token),
            Some(serde_json::json!({ "telegram_id": telegram_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        ids.push(user["id"].as_i64().unwrap());
    }

    let (_, list) = request(&app, "GET", "/api/premium-users", Some(&token), None).await;
    assert_eq!(list["users"].as_array().unwrap().len(), 3);

    let (status, _) = request(
        &app,
        "POST",
        "/api/premium-users/bulk-delete",
        Some(&token),
        Some(serde_json::json!({ "user_ids": [ids[0], ids[1], 424242] })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = request(&app, "GET", "/api/premium-users", Some(&token), None).await;
    assert_eq!(list["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sellers_crud() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let (status, seller) = request(
        &app,
        "POST",
        "/api/sellers",
        Some(&token),
        Some(serde_json::json!({ "username": "goodshop", "country": "DE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seller["is_active"], true);
    let id = seller["id"].as_i64().unwrap();

    let (status, toggled) = request(
        &app,
        "POST",
        &format!("/api/sellers/{id}/toggle"),
        Some(&token),
        Some(serde_json::json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["is_active"], false);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/sellers/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = request(&app, "GET", "/api/sellers", Some(&token), None).await;
    assert!(list["sellers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_web_users_root_only_and_root_protected() {
    let app = spawn_app().await;
    let token = login(&app).await;

    // Root operator is seeded
    let (_, list) = request(&app, "GET", "/api/web-users", Some(&token), None).await;
    let users = list["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["role"], "root");
    let root_id = users[0]["id"].as_i64().unwrap();

    // Short passwords rejected
    let (status, _) = request(
        &app,
        "POST",
        "/api/web-users",
        Some(&token),
        Some(serde_json::json!({ "username": "helper", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = request(
        &app,
        "POST",
        "/api/web-users",
        Some(&token),
        Some(serde_json::json!({ "username": "helper", "password": "long-enough-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["role"], "admin");
    let helper_id = created["id"].as_i64().unwrap();

    // The new operator can log in, but cannot manage accounts
    let helper_token = login_as(&app, "helper", "long-enough-pw")
        .await
        .expect("helper login failed");
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/web-users/{root_id}"),
        Some(&helper_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Even root cannot delete the root record
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/web-users/{root_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, list) = request(&app, "GET", "/api/web-users", Some(&token), None).await;
    assert_eq!(list["users"].as_array().unwrap().len(), 2);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/web-users/{helper_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Deleting the operator killed their sessions
    let (status, _) = request(&app, "GET", "/api/me", Some(&helper_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
