// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! High-level Google Ads service with token management.
//!
//! This service encapsulates:
//! - Login completion (code exchange, userinfo, user upsert)
//! - Token validation and refresh, serialized per user
//! - Discovery of the customer accounts a user can reach
//! - Campaign aggregation across all of a user's accounts

mod accounts;
mod campaigns;
mod login;
mod tokens;

pub use accounts::parse_customer_id;

use crate::config::Config;
use crate::db::Db;
use crate::error::AppError;
use crate::services::google_client::GoogleClient;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared refresh locks type, keyed by user id.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Google OAuth and Ads operations bound to the token store.
#[derive(Clone)]
pub struct GoogleAdsService {
    client: GoogleClient,
    db: Db,
    /// Per-user mutex to serialize token refresh operations.
    refresh_locks: RefreshLocks,
}

impl GoogleAdsService {
    /// Create a new service.
    ///
    /// `refresh_locks` should be shared by every `GoogleAdsService` in the
    /// process so concurrent requests for one user refresh only once.
    pub fn new(config: &Config, db: Db, refresh_locks: RefreshLocks) -> Result<Self, AppError> {
        Ok(Self {
            client: GoogleClient::new(config)?,
            db,
            refresh_locks,
        })
    }
}
