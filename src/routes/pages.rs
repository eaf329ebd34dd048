// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Campaign pages.

use crate::error::{AppError, Result};
use crate::middleware::auth::session_user_id;
use crate::views::UserCampaigns;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/ads-data/{user_id}", get(ads_data))
}

/// Every user with a stored access token and their campaigns.
async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Html<String>> {
    tracing::info!("Accessing the index page");

    let users = state.db.list_users_with_access_token().await?;

    let mut rows = Vec::with_capacity(users.len());
    for user in users {
        // Never fails; one user's provider trouble only empties their row
        let campaigns = state.google.list_campaigns(&user).await;
        rows.push(UserCampaigns {
            user_id: user.id,
            name: user.name,
            email: user.email,
            profile_pic: user.profile_pic,
            campaigns,
        });
    }

    let session_name = session_display_name(&state, &jar).await;
    let html = state
        .templates
        .render_index(session_name.as_deref(), &rows)?;
    Ok(Html(html))
}

/// Campaigns for a single user.
async fn ads_data(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(user_id): Path<String>,
) -> Result<Html<String>> {
    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let campaigns = state.google.list_campaigns(&user).await;

    let session_name = session_display_name(&state, &jar).await;
    let html = state
        .templates
        .render_ads_data(session_name.as_deref(), &user, &campaigns)?;
    Ok(Html(html))
}

/// Name of the signed-in user, if the session is valid and the user exists.
async fn session_display_name(state: &AppState, jar: &CookieJar) -> Option<String> {
    let user_id = session_user_id(jar, &state.config.session_secret)?;
    match state.db.get_user(&user_id).await {
        Ok(user) => user.map(|u| u.name),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to load session user");
            None
        }
    }
}
