//! Integration tests driving the HTTP routes over an in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chirpy_auth::{create_routes, AuthConfig, AuthService, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

fn app() -> Router {
    let config = AuthConfig {
        jwt_secret: "integration-secret-at-least-32-characters".into(),
        polka_key: POLKA_KEY.into(),
        argon2_memory_cost: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        ..AuthConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let auth = Arc::new(AuthService::new(config, store.clone(), store).unwrap());
    create_routes(auth)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router, email: &str, password: &str) -> Value {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn register_returns_public_view() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "email": "a@b.com", "password": "pw1234" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "a@b.com");
    assert_eq!(body["is_chirpy_red"], false);
    assert!(body.get("id").is_some());
    assert!(body.get("hashed_password").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn malformed_body_uses_error_format() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn login_refresh_revoke_flow() {
    let app = app();
    let login = register_and_login(&app, "a@b.com", "pw1234").await;

    let token = login["token"].as_str().unwrap().to_string();
    let refresh = login["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(refresh.len(), 512);

    let (status, me) = send(&app, Method::GET, "/api/me", Some(&format!("Bearer {token}")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], login["id"]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/refresh",
        Some(&format!("Bearer {refresh}")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/revoke",
        Some(&format!("Bearer {refresh}")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/refresh",
        Some(&format!("Bearer {refresh}")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_refresh_token");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = app();
    register_and_login(&app, "a@b.com", "pw1234").await;

    let (unknown_status, unknown) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "x@b.com", "password": "pw1234" })),
    )
    .await;
    let (wrong_status, wrong) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "a@b.com", "password": "nope" })),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&app, Method::GET, "/api/me", Some("Bearer "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/api/me", Some("Bearer not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/users",
        None,
        Some(json!({ "email": "a@b.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_user_changes_credentials() {
    let app = app();
    let login = register_and_login(&app, "a@b.com", "pw1234").await;
    let token = login["token"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/users",
        Some(&format!("Bearer {token}")),
        Some(json!({ "email": "c@d.com", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "c@d.com");
    assert_eq!(body["id"], login["id"]);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "c@d.com", "password": "secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn polka_webhook_upgrades_user() {
    let app = app();
    let login = register_and_login(&app, "a@b.com", "pw1234").await;
    let user_id = login["id"].clone();
    let token = login["token"].as_str().unwrap().to_string();
    let api_key = format!("ApiKey {POLKA_KEY}");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/polka/webhooks",
        Some("ApiKey wrong"),
        Some(json!({ "event": "user.upgraded", "data": { "user_id": user_id } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/polka/webhooks",
        Some(&api_key),
        Some(json!({ "event": "user.deleted", "data": { "user_id": user_id } })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, me) = send(&app, Method::GET, "/api/me", Some(&format!("Bearer {token}")), None).await;
    assert_eq!(me["is_chirpy_red"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/polka/webhooks",
        Some(&api_key),
        Some(json!({ "event": "user.upgraded", "data": { "user_id": user_id } })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, me) = send(&app, Method::GET, "/api/me", Some(&format!("Bearer {token}")), None).await;
    assert_eq!(me["is_chirpy_red"], true);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/polka/webhooks",
        Some(&api_key),
        Some(json!({
            "event": "user.upgraded",
            "data": { "user_id": "00000000-0000-4000-8000-000000000000" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
