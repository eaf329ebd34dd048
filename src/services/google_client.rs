// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth2 and Google Ads REST client.
//!
//! Handles:
//! - OpenID discovery (cached for the process lifetime)
//! - Authorization code exchange and token refresh
//! - Userinfo lookup
//! - Listing accessible customers and their campaigns

use crate::config::{Config, GoogleEndpoints};
use crate::error::AppError;
use crate::models::Campaign;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Scopes requested at login.
pub const OAUTH_SCOPES: [&str; 4] = [
    "openid",
    "email",
    "profile",
    "https://www.googleapis.com/auth/adwords",
];

/// Google API client.
#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    endpoints: GoogleEndpoints,
    client_id: String,
    client_secret: String,
    developer_token: String,
    discovery: Arc<RwLock<Option<DiscoveryDocument>>>,
}

impl GoogleClient {
    /// Create a new client with OAuth credentials and a bounded request timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            http,
            endpoints: config.endpoints.clone(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            developer_token: config.google_ads_developer_token.clone(),
            discovery: Arc::new(RwLock::new(None)),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Fetch the OpenID discovery document, reusing a cached copy.
    pub async fn discovery_document(&self) -> Result<DiscoveryDocument, AppError> {
        if let Some(doc) = self.discovery.read().await.as_ref() {
            return Ok(doc.clone());
        }

        let response = self
            .http
            .get(&self.endpoints.discovery_url)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Discovery request failed: {}", e)))?;

        let doc: DiscoveryDocument = self.check_response_json(response).await?;
        tracing::debug!(
            authorization_endpoint = %doc.authorization_endpoint,
            "Google discovery document cached"
        );

        *self.discovery.write().await = Some(doc.clone());
        Ok(doc)
    }

    /// Exchange an authorization code at the discovered token endpoint.
    ///
    /// Authenticates as a confidential client with HTTP Basic auth.
    pub async fn exchange_code(
        &self,
        token_endpoint: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(token_endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange failed");
            return Err(AppError::GoogleApi(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Failed to parse token response: {}", e)))
    }

    /// Refresh an expired access token at the fixed refresh endpoint.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.endpoints.refresh_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::TokenRefresh(format!("Refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::TokenRefresh(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::TokenRefresh(format!("JSON parse error: {}", e)))
    }

    /// Get the signed-in user's profile.
    pub async fn fetch_userinfo(
        &self,
        userinfo_endpoint: &str,
        access_token: &str,
    ) -> Result<UserInfo, AppError> {
        let response = self
            .http
            .get(userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Userinfo request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// List the resource names (`customers/{id}`) the token can access.
    pub async fn list_accessible_customers(
        &self,
        access_token: &str,
    ) -> Result<Vec<String>, AppError> {
        let url = format!(
            "{}/customers:listAccessibleCustomers",
            self.endpoints.ads_api_base
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header("developer-token", &self.developer_token)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        let body: AccessibleCustomersResponse = self.check_response_json(response).await?;
        Ok(body.resource_names)
    }

    /// List campaigns for one customer account.
    pub async fn list_campaigns(
        &self,
        access_token: &str,
        customer_id: &str,
    ) -> Result<Vec<Campaign>, AppError> {
        let url = format!(
            "{}/customers/{}/campaigns",
            self.endpoints.ads_api_base, customer_id
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header("developer-token", &self.developer_token)
            .header("login-customer-id", customer_id)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        let body: CampaignsResponse = self.check_response_json(response).await?;
        Ok(body.campaigns)
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Google API rate limit hit (429)");
            }

            return Err(AppError::GoogleApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GoogleApi(format!("JSON parse error: {}", e)))
    }
}

/// Subset of the OpenID discovery document we use.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryDocument {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
}

/// Token endpoint response (code exchange or refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Usually omitted on refresh
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of `access_token` in seconds
    pub expires_in: i64,
}

impl TokenResponse {
    /// Absolute expiry of `access_token` counted from `now`.
    ///
    /// `None` when `expires_in` does not fit in a timestamp.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_add_signed(Duration::try_seconds(self.expires_in)?)
    }
}

/// Userinfo endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub given_name: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessibleCustomersResponse {
    #[serde(default)]
    resource_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CampaignsResponse {
    #[serde(default)]
    campaigns: Vec<Campaign>,
}
