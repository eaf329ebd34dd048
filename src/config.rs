// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Client credentials, the Ads developer token and the session secret are
//! never compiled in; they must come from the environment (or a local `.env`).

use std::env;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:///database.db";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Google endpoints used by the application.
///
/// The authorization, code-exchange and userinfo endpoints are discovered at
/// runtime from `discovery_url`; refresh always goes to `refresh_url`.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub discovery_url: String,
    pub refresh_url: String,
    /// Versioned Google Ads REST base, without trailing slash.
    pub ads_api_base: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            discovery_url: "https://accounts.google.com/.well-known/openid-configuration"
                .to_string(),
            refresh_url: "https://oauth2.googleapis.com/token".to_string(),
            ads_api_base: "https://googleads.googleapis.com/v8".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Point every endpoint at one host (used against mock servers).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            discovery_url: format!("{}/.well-known/openid-configuration", base),
            refresh_url: format!("{}/token", base),
            ads_api_base: format!("{}/v8", base),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Google Ads API developer token
    pub google_ads_developer_token: String,
    /// Database connection string
    pub database_url: String,
    /// Key used to sign session cookies and OAuth state (raw bytes)
    pub session_secret: Vec<u8>,
    /// Server port
    pub port: u16,
    /// Timeout applied to every outbound request
    pub http_timeout: Duration,
    pub endpoints: GoogleEndpoints,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id".to_string(),
            google_client_secret: "test_client_secret".to_string(),
            google_ads_developer_token: "test_developer_token".to_string(),
            database_url: ":memory:".to_string(),
            session_secret: b"test_session_key_32_bytes_min!!!".to_vec(),
            port: 8080,
            http_timeout: Duration::from_secs(5),
            endpoints: GoogleEndpoints::default(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let http_timeout_secs = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid("HTTP_TIMEOUT_SECS"))?,
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
            google_ads_developer_token: required("GOOGLE_ADS_DEVELOPER_TOKEN")?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            session_secret: required("SESSION_SECRET")?.into_bytes(),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            http_timeout: Duration::from_secs(http_timeout_secs),
            endpoints: GoogleEndpoints::default(),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
