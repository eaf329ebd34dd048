// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth login routes.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    routing::get,
    Extension, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, session_cookie, session_removal_cookie, AuthUser};
use crate::routes::{is_local_host, request_host};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Cookie binding an OAuth state to the browser that started the login.
pub const OAUTH_NONCE_COOKIE: &str = "ads_oauth_nonce";

const CALLBACK_PATH: &str = "/login/callback";
const OAUTH_STATE_MAX_AGE_SECS: u64 = 10 * 60;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login))
        .route(CALLBACK_PATH, get(login_callback))
}

/// Routes that need an authenticated session.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/logout", get(logout))
}

/// Start OAuth flow - redirect to Google authorization.
async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let host = request_host(&headers);
    let secure = !is_local_host(&host);

    let nonce = generate_nonce()?;
    let oauth_state = create_oauth_state(&nonce, unix_now()?, &state.config.session_secret)?;

    let auth_url = state
        .google
        .authorization_url(&callback_url(&host), &oauth_state)
        .await?;

    tracing::info!(host = %host, "Starting OAuth flow, redirecting to Google");

    Ok((
        jar.add(nonce_cookie(nonce, secure)),
        Redirect::temporary(&auth_url),
    ))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, create session.
async fn login_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Err(AppError::BadRequest(format!("Authorization failed: {}", error)));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let expected_nonce = jar
        .get(OAUTH_NONCE_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_default();

    let state_valid = verify_oauth_state(
        params.state.as_deref().unwrap_or_default(),
        &expected_nonce,
        unix_now()?,
        &state.config.session_secret,
    );
    if expected_nonce.is_empty() || !state_valid {
        tracing::warn!("Invalid, expired or tampered OAuth state");
        return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
    }

    let host = request_host(&headers);
    let secure = !is_local_host(&host);

    tracing::info!("Exchanging authorization code for tokens");
    let user = state
        .google
        .complete_login(&code, &callback_url(&host))
        .await?;

    let jwt = create_jwt(&user.id, &state.config.session_secret)?;

    let jar = jar
        .remove(nonce_removal_cookie(secure))
        .add(session_cookie(jwt, secure));

    Ok((jar, Redirect::temporary("/")))
}

/// Logout - drop the session cookie. Stored tokens are kept.
async fn logout(
    headers: HeaderMap,
    jar: CookieJar,
    Extension(user): Extension<AuthUser>,
) -> (CookieJar, Redirect) {
    let secure = !is_local_host(&request_host(&headers));
    tracing::info!(user_id = %user.user_id, "User logged out");
    (
        jar.remove(session_removal_cookie(secure)),
        Redirect::temporary("/"),
    )
}

fn callback_url(host: &str) -> String {
    let scheme = if is_local_host(host) { "http" } else { "https" };
    format!("{}://{}{}", scheme, host, CALLBACK_PATH)
}

fn nonce_cookie(nonce: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_NONCE_COOKIE, nonce))
        .path(CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(OAUTH_STATE_MAX_AGE_SECS as i64))
        .build()
}

fn nonce_removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_NONCE_COOKIE, ""))
        .path(CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn generate_nonce() -> Result<String> {
    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(bytes))
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_secs())
}

/// Build a signed OAuth state: base64url("nonce|timestamp_hex|signature_hex").
pub fn create_oauth_state(nonce: &str, issued_at: u64, secret: &[u8]) -> anyhow::Result<String> {
    let payload = format!("{}|{:x}", nonce, issued_at);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Check signature, age and nonce of an OAuth state parameter.
fn verify_oauth_state(state: &str, expected_nonce: &str, now: u64, secret: &[u8]) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    let &[nonce, timestamp_hex, signature_hex] = parts.as_slice() else {
        return false;
    };

    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(format!("{}|{}", nonce, timestamp_hex).as_bytes());

    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    let Ok(issued_at) = u64::from_str_radix(timestamp_hex, 16) else {
        return false;
    };
    if issued_at > now || now - issued_at > OAUTH_STATE_MAX_AGE_SECS {
        return false;
    }

    nonce == expected_nonce
}
