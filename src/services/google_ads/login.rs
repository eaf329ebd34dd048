// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth login: authorization URL and callback handling.

use super::GoogleAdsService;
use crate::error::AppError;
use crate::models::User;
use crate::services::google_client::OAUTH_SCOPES;
use chrono::Utc;

impl GoogleAdsService {
    /// Build the provider authorization URL for a login attempt.
    pub async fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, AppError> {
        let discovery = self.client.discovery_document().await?;

        let separator = if discovery.authorization_endpoint.contains('?') {
            '&'
        } else {
            '?'
        };

        Ok(format!(
            "{}{}response_type=code&\
             client_id={}&\
             redirect_uri={}&\
             scope={}&\
             access_type=offline&\
             state={}",
            discovery.authorization_endpoint,
            separator,
            urlencoding::encode(self.client.client_id()),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&OAUTH_SCOPES.join(" ")),
            urlencoding::encode(state),
        ))
    }

    /// Handle OAuth callback: exchange code, verify identity, store user and
    /// tokens, then discover the user's accounts.
    ///
    /// An unverified or missing email aborts before anything is stored.
    pub async fn complete_login(&self, code: &str, redirect_uri: &str) -> Result<User, AppError> {
        let discovery = self.client.discovery_document().await?;

        let tokens = self
            .client
            .exchange_code(&discovery.token_endpoint, code, redirect_uri)
            .await?;
        let token_expiry = tokens.expiry_from(Utc::now()).ok_or_else(|| {
            AppError::GoogleApi(format!(
                "Token response has invalid expires_in: {}",
                tokens.expires_in
            ))
        })?;

        let userinfo = self
            .client
            .fetch_userinfo(&discovery.userinfo_endpoint, &tokens.access_token)
            .await?;

        let email = match (userinfo.email_verified, userinfo.email) {
            (Some(true), Some(email)) => email,
            _ => {
                tracing::error!(sub = %userinfo.sub, "User email not verified by Google");
                return Err(AppError::EmailNotVerified);
            }
        };

        let existing = self.db.get_user(&userinfo.sub).await?;

        let user = User {
            id: userinfo.sub,
            name: userinfo
                .given_name
                .or(userinfo.name)
                .unwrap_or_else(|| email.clone()),
            email,
            profile_pic: userinfo.picture,
            access_token: Some(tokens.access_token),
            refresh_token: tokens
                .refresh_token
                .or_else(|| existing.as_ref().and_then(|u| u.refresh_token.clone())),
            token_expiry: Some(token_expiry),
        };

        self.db.upsert_user_login(&user).await?;

        if existing.is_none() {
            tracing::info!(user_id = %user.id, "New user created");
        }

        // Discovery must never block the login
        if let Some(access_token) = user.access_token.as_deref() {
            if let Err(e) = self.discover_accounts(&user, access_token).await {
                tracing::warn!(user_id = %user.id, error = %e, "Account discovery failed, continuing anyway");
            }
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }
}
