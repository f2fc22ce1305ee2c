//! In-process test harness: the real router over the in-memory store,
//! driven with oneshot requests. No network, no database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use flock_api::app::{app, AppState};
use flock_api::store::MemoryStore;
use flock_api::types::{Profile, ProfileStatus, Role};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

pub fn test_app() -> TestApp {
    // RUST_LOG=debug surfaces request traces when a test fails.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();

    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone());
    TestApp {
        router: app(state),
        store,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn json_request(
    method: &str,
    path: &str,
    token: Option<&str>,
    body: &Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("response is JSON")
}

/// Sends, asserts the status, and unwraps the `data` payload of the
/// success envelope.
pub async fn expect_data(
    app: &TestApp,
    request: Request<Body>,
    status: StatusCode,
) -> Value {
    let response = app.send(request).await;
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true), "expected success envelope: {body}");
    body["data"].clone()
}

/// Sends, asserts the status, and returns the error envelope.
pub async fn expect_error(
    app: &TestApp,
    request: Request<Body>,
    status: StatusCode,
) -> Value {
    let response = app.send(request).await;
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false), "expected error envelope: {body}");
    body
}

pub async fn register(app: &TestApp, email: &str) -> String {
    register_with_id(app, email).await.1
}

pub async fn register_with_id(app: &TestApp, email: &str) -> (Uuid, String) {
    let data = expect_data(
        app,
        json_request(
            "POST",
            "/auth/register",
            None,
            &json!({ "email": email, "password": "hunter2-secret" }),
        ),
        StatusCode::CREATED,
    )
    .await;
    let user_id = data["user"]["id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("user id in response");
    let token = data["token"].as_str().expect("token in response").to_string();
    (user_id, token)
}

/// Binds an existing account to a church at the given role by writing the
/// profile row directly. The session layer reads the row, so the account's
/// current token picks up the binding on its next request.
pub async fn seed_profile(app: &TestApp, user_id: Uuid, church_id: Uuid, role: Role) {
    app.store
        .insert_profile(Profile {
            id: Uuid::new_v4(),
            user_id,
            church_id,
            full_name: "Seeded Profile".to_string(),
            phone: None,
            role,
            status: ProfileStatus::Active,
            is_verified: true,
            created_at: chrono::Utc::now(),
        })
        .await;
}

pub fn onboarding_body(name: &str, slug: &str, country: &str) -> Value {
    json!({
        "church": {
            "name": name,
            "slug": slug,
            "address": null,
            "city": null,
            "state": null,
            "country": country,
            "phone": null,
            "email": null
        },
        "theme": {
            "systemName": name,
            "primaryColor": "#1e40af",
            "secondaryColor": "#9333ea"
        },
        "admin": {
            "fullName": "Founding Admin",
            "phone": null
        }
    })
}

/// Registers a fresh account and onboards a church, returning the church
/// id and the re-minted bound token.
pub async fn onboarded_church(
    app: &TestApp,
    email: &str,
    name: &str,
    slug: &str,
) -> (Uuid, String) {
    let token = register(app, email).await;
    let data = expect_data(
        app,
        json_request(
            "POST",
            "/api/onboarding",
            Some(&token),
            &onboarding_body(name, slug, "BR"),
        ),
        StatusCode::CREATED,
    )
    .await;
    let church_id = data["church_id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("church id in response");
    let fresh = data["token"].as_str().expect("fresh token").to_string();
    (church_id, fresh)
}
