// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTML views rendered with Handlebars.

use crate::error::AppError;
use crate::models::{Campaign, User};
use chrono::SecondsFormat;
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;

/// Compiled page templates.
#[derive(Clone)]
pub struct Templates {
    registry: Arc<Handlebars<'static>>,
}

/// One user's row on the index page.
#[derive(Serialize)]
pub struct UserCampaigns {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub campaigns: Vec<Campaign>,
}

#[derive(Serialize)]
struct IndexPage<'a> {
    session_user: Option<&'a str>,
    users: &'a [UserCampaigns],
}

#[derive(Serialize)]
struct AdsDataPage<'a> {
    session_user: Option<&'a str>,
    name: &'a str,
    email: &'a str,
    profile_pic: Option<&'a str>,
    token_expiry: Option<String>,
    campaigns: &'a [Campaign],
}

impl Templates {
    /// Register all page templates.
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        let templates = [
            ("layout_head", include_str!("../templates/layout_head.hbs")),
            ("campaigns", include_str!("../templates/campaigns.hbs")),
            ("index", include_str!("../templates/index.hbs")),
            ("ads_data", include_str!("../templates/ads_data.hbs")),
        ];

        for (name, source) in templates {
            registry.register_template_string(name, source).map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Template {} failed to compile: {}", name, e))
            })?;
        }

        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// All users with their aggregated campaigns.
    pub fn render_index(
        &self,
        session_user: Option<&str>,
        users: &[UserCampaigns],
    ) -> Result<String, AppError> {
        self.render("index", &IndexPage {
            session_user,
            users,
        })
    }

    /// A single user's campaigns.
    pub fn render_ads_data(
        &self,
        session_user: Option<&str>,
        user: &User,
        campaigns: &[Campaign],
    ) -> Result<String, AppError> {
        self.render("ads_data", &AdsDataPage {
            session_user,
            name: &user.name,
            email: &user.email,
            profile_pic: user.profile_pic.as_deref(),
            token_expiry: user
                .token_expiry
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            campaigns,
        })
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, AppError> {
        self.registry
            .render(name, data)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to render {}: {}", name, e)))
    }
}
