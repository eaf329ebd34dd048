// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth login flow tests, driven through the router.

use ads_campaign_viewer::routes::auth::{create_oauth_state, OAUTH_NONCE_COOKIE};
use ads_campaign_viewer::AppState;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use chrono::Utc;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{create_test_app, mount_discovery};

const NONCE: &str = "0123456789abcdef0123456789abcdef";

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn valid_state(state: &AppState) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    create_oauth_state(NONCE, now, &state.config.session_secret).unwrap()
}

fn callback_request(code: &str, oauth_state: &str) -> Request<Body> {
    Request::builder()
        .uri(format!(
            "/login/callback?code={}&state={}",
            code,
            urlencoding::encode(oauth_state)
        ))
        .header(header::HOST, "localhost")
        .header(header::COOKIE, format!("{}={}", OAUTH_NONCE_COOKIE, NONCE))
        .body(Body::empty())
        .unwrap()
}

async fn mount_code_exchange(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth2/code-token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=test-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "refresh_token": "RT1",
            "expires_in": 3600,
            "token_type": "Bearer",
        })))
        .mount(server)
        .await;
}

async fn mount_userinfo(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v1/userinfo"))
        .and(header_eq("authorization", "Bearer AT1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_redirects_to_provider() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    let (app, _) = create_test_app(&server.uri());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/login")
                .header(header::HOST, "localhost:5001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let target = location(&response);
    assert!(target.starts_with(&format!("{}/o/oauth2/v2/auth?", server.uri())));
    assert!(target.contains("response_type=code"));
    assert!(target.contains("client_id=test_client_id"));
    assert!(target.contains("access_type=offline"));
    assert!(target.contains("state="));
    assert!(target.contains(&format!(
        "redirect_uri={}",
        urlencoding::encode("http://localhost:5001/login/callback")
    )));
    assert!(target.contains("adwords"));

    let cookies = set_cookie_headers(&response);
    let nonce = find_cookie(&cookies, OAUTH_NONCE_COOKIE).expect("nonce cookie");
    assert!(nonce.contains("Path=/login/callback"));
    assert!(nonce.contains("HttpOnly"));
    assert!(!nonce.contains("Secure"));
}

#[tokio::test]
async fn test_verified_callback_creates_user_and_accounts() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_code_exchange(&server).await;
    mount_userinfo(
        &server,
        json!({
            "sub": "sub-123",
            "email": "a@example.com",
            "email_verified": true,
            "given_name": "Ann",
            "picture": "https://example.com/ann.png",
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v8/customers:listAccessibleCustomers"))
        .and(header_eq("authorization", "Bearer AT1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceNames": ["customers/111", "customers/222"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (app, state) = create_test_app(&server.uri());
    let oauth_state = valid_state(&state);

    let before = Utc::now();
    let response = app
        .oneshot(callback_request("test-code", &oauth_state))
        .await
        .unwrap();
    let after = Utc::now();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");

    let cookies = set_cookie_headers(&response);
    let session = find_cookie(&cookies, "ads_session").expect("session cookie");
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("Path=/"));

    let user = state.db.get_user("sub-123").await.unwrap().expect("user row");
    assert_eq!(user.name, "Ann");
    assert_eq!(user.email, "a@example.com");
    assert_eq!(user.profile_pic.as_deref(), Some("https://example.com/ann.png"));
    assert_eq!(user.access_token.as_deref(), Some("AT1"));
    assert_eq!(user.refresh_token.as_deref(), Some("RT1"));
    let expiry = user.token_expiry.expect("expiry");
    assert!(expiry >= before + chrono::Duration::seconds(3600));
    assert!(expiry <= after + chrono::Duration::seconds(3600));

    let accounts = state.db.list_accounts("sub-123").await.unwrap();
    let mut ids: Vec<_> = accounts.iter().map(|a| a.customer_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["111", "222"]);
}

#[tokio::test]
async fn test_repeat_login_keeps_refresh_token_and_accounts() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    // Second consent omits the refresh token
    Mock::given(method("POST"))
        .and(path("/oauth2/code-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;
    mount_userinfo(
        &server,
        json!({ "sub": "sub-123", "email": "a@example.com", "email_verified": true, "name": "Ann Full" }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v8/customers:listAccessibleCustomers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceNames": ["customers/111"]
        })))
        .mount(&server)
        .await;

    let (app, state) = create_test_app(&server.uri());
    let existing = common::user_with_expiry("sub-123", chrono::Duration::minutes(-5));
    common::seed_user(&state.db, &existing, &["111"]).await;

    let response = app
        .oneshot(callback_request("test-code", &valid_state(&state)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let user = state.db.get_user("sub-123").await.unwrap().unwrap();
    assert_eq!(user.name, "Ann Full");
    assert_eq!(user.access_token.as_deref(), Some("AT1"));
    assert_eq!(user.refresh_token.as_deref(), Some("sub-123-refresh"));
    assert_eq!(state.db.list_accounts("sub-123").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unverified_email_is_rejected_without_storing() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_code_exchange(&server).await;
    mount_userinfo(
        &server,
        json!({ "sub": "sub-123", "email": "a@example.com", "email_verified": false }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v8/customers:listAccessibleCustomers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "resourceNames": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let (app, state) = create_test_app(&server.uri());
    let response = app
        .oneshot(callback_request("test-code", &valid_state(&state)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(find_cookie(&set_cookie_headers(&response), "ads_session").is_none());

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(body.to_vec()).unwrap(),
        "User email not available or not verified by Google."
    );

    assert!(state.db.get_user("sub-123").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_email_is_rejected() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_code_exchange(&server).await;
    mount_userinfo(&server, json!({ "sub": "sub-123", "email_verified": true })).await;

    let (app, state) = create_test_app(&server.uri());
    let response = app
        .oneshot(callback_request("test-code", &valid_state(&state)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.db.get_user("sub-123").await.unwrap().is_none());
}

#[tokio::test]
async fn test_callback_rejects_forged_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (app, _) = create_test_app(&server.uri());
    let forged = create_oauth_state(NONCE, 1_700_000_000, b"not-the-session-secret").unwrap();

    let response = app
        .oneshot(callback_request("test-code", &forged))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_requires_nonce_cookie() {
    let server = MockServer::start().await;
    let (app, state) = create_test_app(&server.uri());

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/login/callback?code=test-code&state={}",
                    valid_state(&state)
                ))
                .header(header::HOST, "localhost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_without_code_is_bad_request() {
    let server = MockServer::start().await;
    let (app, _) = create_test_app(&server.uri());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/login/callback?error=access_denied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_code_exchange_stores_nothing() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("POST"))
        .and(path("/oauth2/code-token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;

    let (app, state) = create_test_app(&server.uri());
    let response = app
        .oneshot(callback_request("test-code", &valid_state(&state)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(state
        .db
        .list_users_with_access_token()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_out_of_range_token_lifetime_stores_nothing() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    Mock::given(method("POST"))
        .and(path("/oauth2/code-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "AT1",
            "refresh_token": "RT1",
            "expires_in": i64::MAX,
        })))
        .mount(&server)
        .await;

    let (app, state) = create_test_app(&server.uri());
    let response = app
        .oneshot(callback_request("test-code", &valid_state(&state)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(state.db.get_user("sub-123").await.unwrap().is_none());
}

#[tokio::test]
async fn test_lookalike_local_host_gets_secure_cookie() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    let (app, _) = create_test_app(&server.uri());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/login")
                .header(header::HOST, "localhost.evil.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(location(&response).contains(&format!(
        "redirect_uri={}",
        urlencoding::encode("https://localhost.evil.com/login/callback")
    )));

    let cookies = set_cookie_headers(&response);
    let nonce = find_cookie(&cookies, OAUTH_NONCE_COOKIE).expect("nonce cookie");
    assert!(nonce.contains("Secure"));
}
