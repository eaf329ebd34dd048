// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token validation and refresh.

use super::GoogleAdsService;
use crate::error::AppError;
use crate::models::User;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

impl GoogleAdsService {
    /// Get a valid (non-expired) access token for the given user.
    ///
    /// 1. If the stored token has not expired, return it (no I/O)
    /// 2. Acquire the per-user refresh lock
    /// 3. Re-read the user; another task may have refreshed meanwhile
    /// 4. Exchange the refresh token and persist the new token triple
    ///
    /// Any failure leaves the stored tokens untouched and is reported as
    /// `AppError::TokenRefresh`.
    pub async fn ensure_valid_access_token(&self, user: &User) -> Result<String, AppError> {
        if let Some(token) = user.valid_access_token(Utc::now()) {
            return Ok(token.to_string());
        }

        let lock = self
            .refresh_locks
            .entry(user.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        let current = self
            .db
            .get_user(&user.id)
            .await
            .map_err(|e| AppError::TokenRefresh(format!("Failed to reload user: {}", e)))?
            .ok_or_else(|| AppError::TokenRefresh(format!("User {} no longer exists", user.id)))?;

        if let Some(token) = current.valid_access_token(Utc::now()) {
            tracing::debug!(user_id = %user.id, "Token already refreshed by another request");
            return Ok(token.to_string());
        }

        let refresh_token = current.refresh_token.as_deref().ok_or_else(|| {
            AppError::TokenRefresh(format!("No refresh token stored for user {}", user.id))
        })?;

        tracing::info!(user_id = %user.id, "Access token expired, refreshing");

        let refreshed = match self.client.refresh_access_token(refresh_token).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to refresh access token");
                return Err(e);
            }
        };

        let token_expiry = refreshed.expiry_from(Utc::now()).ok_or_else(|| {
            tracing::error!(
                user_id = %user.id,
                expires_in = refreshed.expires_in,
                "Refresh response has an out-of-range lifetime"
            );
            AppError::TokenRefresh(format!("Invalid expires_in: {}", refreshed.expires_in))
        })?;

        let saved = self
            .db
            .save_tokens(
                &user.id,
                &refreshed.access_token,
                refreshed.refresh_token.as_deref(),
                token_expiry,
            )
            .await
            .map_err(|e| AppError::TokenRefresh(format!("Failed to store tokens: {}", e)))?;

        if !saved {
            return Err(AppError::TokenRefresh(format!(
                "User {} disappeared during refresh",
                user.id
            )));
        }

        tracing::info!(
            user_id = %user.id,
            expires_in = refreshed.expires_in,
            rotated_refresh_token = refreshed.refresh_token.is_some(),
            "Token refreshed and stored"
        );
        Ok(refreshed.access_token)
    }
}
