//! Route gate behavior over the full router: redirects for page
//! navigation, pass-through for public and API paths.

mod common;

use anyhow::Result;
use axum::http::{header, StatusCode};
use serde_json::json;

use common::{body_json, expect_data, get, onboarded_church, register, test_app};

fn location(response: &axum::http::Response<axum::body::Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login() -> Result<()> {
    let app = test_app();

    let response = app.send(get("/dashboard", None)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");

    Ok(())
}

#[tokio::test]
async fn a_garbage_token_counts_as_anonymous() -> Result<()> {
    let app = test_app();

    let response = app.send(get("/dashboard", Some("not-a-jwt"))).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login");

    Ok(())
}

#[tokio::test]
async fn accounts_without_a_church_are_sent_to_onboarding() -> Result<()> {
    let app = test_app();
    let token = register(&app, "newcomer@example.com").await;

    let response = app.send(get("/dashboard", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/onboarding");

    Ok(())
}

#[tokio::test]
async fn bound_accounts_skip_the_onboarding_page() -> Result<()> {
    let app = test_app();
    let (_, token) = onboarded_church(&app, "pastor@example.com", "First Church", "first").await;

    let response = app.send(get("/onboarding", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");

    Ok(())
}

#[tokio::test]
async fn signed_in_accounts_skip_the_login_page() -> Result<()> {
    let app = test_app();
    let token = register(&app, "returning@example.com").await;

    for path in ["/login", "/register"] {
        let response = app.send(get(path, Some(&token))).await;
        assert_eq!(
            response.status(),
            StatusCode::TEMPORARY_REDIRECT,
            "{path} should bounce a signed-in account"
        );
        assert_eq!(location(&response), "/dashboard");
    }

    Ok(())
}

#[tokio::test]
async fn bound_accounts_reach_the_dashboard() -> Result<()> {
    let app = test_app();
    let (church_id, token) =
        onboarded_church(&app, "admin@example.com", "Hilltop Chapel", "hilltop").await;

    let data = expect_data(&app, get("/dashboard", Some(&token)), StatusCode::OK).await;
    assert_eq!(data["church"]["id"], json!(church_id.to_string()));
    assert_eq!(data["profile"]["role"], json!("master"));

    Ok(())
}

#[tokio::test]
async fn the_session_cookie_works_for_page_navigation() -> Result<()> {
    let app = test_app();
    let (_, token) = onboarded_church(&app, "cookie@example.com", "Cookie Church", "cookie").await;

    let request = axum::http::Request::builder()
        .uri("/dashboard")
        .header(header::COOKIE, format!("flock_session={token}"))
        .body(axum::body::Body::empty())?;
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn public_paths_need_no_session() -> Result<()> {
    let app = test_app();

    let response = app.send(get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Unknown church, but the gate let the request through to the handler.
    let response = app.send(get("/visit/no-such-church", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("NOT_FOUND"));

    // Static assets fall through to the router, never to a redirect.
    let response = app.send(get("/logo.svg", None)).await;
    assert_ne!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    Ok(())
}

#[tokio::test]
async fn prefix_matching_stops_at_segment_boundaries() -> Result<()> {
    let app = test_app();

    // Neither path is under /visit or /login, so both are protected.
    for path in ["/visiting", "/loginish"] {
        let response = app.send(get(path, None)).await;
        assert_eq!(
            response.status(),
            StatusCode::TEMPORARY_REDIRECT,
            "{path} is not a public path"
        );
        assert_eq!(location(&response), "/login");
    }

    Ok(())
}

#[tokio::test]
async fn api_requests_are_answered_not_redirected() -> Result<()> {
    let app = test_app();

    // Anonymous API calls get status codes from the handler.
    let response = app.send(get("/api/church", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("UNAUTHORIZED"));

    let data = expect_data(&app, get("/api/auth/whoami", None), StatusCode::OK).await;
    assert_eq!(data["authenticated"], json!(false));

    Ok(())
}

#[tokio::test]
async fn the_gate_attaches_the_session_to_api_requests() -> Result<()> {
    let app = test_app();
    let (church_id, token) =
        onboarded_church(&app, "whoami@example.com", "Valley Church", "valley").await;

    let data = expect_data(&app, get("/api/auth/whoami", Some(&token)), StatusCode::OK).await;
    assert_eq!(data["authenticated"], json!(true));
    assert_eq!(data["binding"]["church_id"], json!(church_id.to_string()));
    assert_eq!(data["binding"]["role"], json!("master"));

    Ok(())
}
