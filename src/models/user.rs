//! User and linked-account models for storage and views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile and current OAuth token state, stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Google subject identifier (primary key)
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address (verified at login)
    pub email: String,
    /// Profile picture URL
    pub profile_pic: Option<String>,
    /// Current access token; `token_expiry` is always set alongside it
    pub access_token: Option<String>,
    /// Long-lived refresh token
    pub refresh_token: Option<String>,
    /// Instant after which `access_token` must not be used
    pub token_expiry: Option<DateTime<Utc>>,
}

impl User {
    /// The stored access token, if present and not yet expired at `now`.
    pub fn valid_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.access_token, self.token_expiry) {
            (Some(token), Some(expiry)) if now < expiry => Some(token.as_str()),
            _ => None,
        }
    }
}

/// One Google Ads customer account linked to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleAdsAccount {
    pub id: i64,
    pub user_id: String,
    pub customer_id: String,
}
