// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google_ads;
pub mod google_client;

pub use google_ads::{parse_customer_id, GoogleAdsService, RefreshLocks};
pub use google_client::{DiscoveryDocument, GoogleClient, TokenResponse, UserInfo};
