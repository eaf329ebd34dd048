// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ads Campaign Viewer server
//!
//! Signs users in with Google and lists the campaigns of every Google Ads
//! account they have access to.

use ads_campaign_viewer::{
    config::Config, db::Db, services::GoogleAdsService, views::Templates, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Ads Campaign Viewer");

    // Open the database and make sure the schema exists
    let db = Db::open(&config.database_url)?;

    // Per-user refresh locks, shared by every request in this process
    let refresh_locks = Arc::new(dashmap::DashMap::new());

    let google = GoogleAdsService::new(&config, db.clone(), refresh_locks)?;
    let templates = Templates::new()?;

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        google,
        templates,
    });

    // Build router
    let app = ads_campaign_viewer::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ads_campaign_viewer=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
