// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Ads Campaign Viewer: Google Ads campaigns across every linked account
//!
//! This crate provides a small web application that signs users in with
//! Google, keeps their OAuth tokens fresh, and lists the campaigns of every
//! advertiser account they can reach.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;

use config::Config;
use db::Db;
use services::GoogleAdsService;
use views::Templates;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub google: GoogleAdsService,
    pub templates: Templates,
}
