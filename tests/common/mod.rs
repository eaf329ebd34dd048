// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use ads_campaign_viewer::config::{Config, GoogleEndpoints};
use ads_campaign_viewer::db::Db;
use ads_campaign_viewer::models::User;
use ads_campaign_viewer::routes::create_router;
use ads_campaign_viewer::services::GoogleAdsService;
use ads_campaign_viewer::views::Templates;
use ads_campaign_viewer::AppState;
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config whose Google endpoints all point at `mock_uri`.
#[allow(dead_code)]
pub fn test_config(mock_uri: &str) -> Config {
    Config {
        endpoints: GoogleEndpoints::with_base(mock_uri),
        ..Config::test_default()
    }
}

/// Create a service backed by an in-memory database and the mock server.
#[allow(dead_code)]
pub fn test_service(mock_uri: &str) -> (GoogleAdsService, Db) {
    let config = test_config(mock_uri);
    let db = Db::open_in_memory().expect("in-memory database");
    let service = GoogleAdsService::new(&config, db.clone(), Arc::new(dashmap::DashMap::new()))
        .expect("service");
    (service, db)
}

/// Create a test app wired to the mock server.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(mock_uri: &str) -> (axum::Router, Arc<AppState>) {
    let config = test_config(mock_uri);
    let (google, db) = test_service(mock_uri);

    let state = Arc::new(AppState {
        config,
        db,
        google,
        templates: Templates::new().expect("templates"),
    });

    (create_router(state.clone()), state)
}

/// A user whose access token expires `expires_in` from now (negative = expired).
#[allow(dead_code)]
pub fn user_with_expiry(id: &str, expires_in: Duration) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@example.com", id),
        profile_pic: None,
        access_token: Some(format!("{}-access", id)),
        refresh_token: Some(format!("{}-refresh", id)),
        token_expiry: Some(Utc::now() + expires_in),
    }
}

/// Store `user` and link the given customer ids to it.
#[allow(dead_code)]
pub async fn seed_user(db: &Db, user: &User, customer_ids: &[&str]) {
    db.upsert_user_login(user).await.expect("seed user");
    for customer_id in customer_ids {
        db.add_account_if_absent(&user.id, customer_id)
            .await
            .expect("seed account");
    }
}

/// Serve the OpenID discovery document pointing back at the mock server.
#[allow(dead_code)]
pub async fn mount_discovery(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": "https://accounts.google.com",
            "authorization_endpoint": format!("{}/o/oauth2/v2/auth", server.uri()),
            "token_endpoint": format!("{}/oauth2/code-token", server.uri()),
            "userinfo_endpoint": format!("{}/v1/userinfo", server.uri()),
        })))
        .mount(server)
        .await;
}

/// Campaign list body for one account.
#[allow(dead_code)]
pub fn campaigns_body(customer_id: &str, names: &[&str]) -> serde_json::Value {
    let campaigns: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "resourceName": format!("customers/{}/campaigns/{}", customer_id, i + 1),
                "id": format!("{}", i + 1),
                "name": name,
                "status": "ENABLED",
            })
        })
        .collect();
    json!({ "campaigns": campaigns })
}
