// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in routes and session lifecycle.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use url::Url;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::require_auth;
use crate::services::session::{Session, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::services::signin::complete_sign_in;
use crate::time_utils::now_epoch_secs;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a sign-in attempt may take before its `state` is rejected.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

/// Path of the OAuth callback on this service.
pub const CALLBACK_PATH: &str = "/auth/google/callback";

/// Public sign-in routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route(CALLBACK_PATH, get(auth_callback))
        .route("/auth/logout", post(logout))
}

/// Routes that need an established session.
pub fn session_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", get(get_session))
        .route_layer(axum::middleware::from_fn_with_state(state, require_auth))
}

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend URL to redirect back to after sign-in completes.
    /// If not provided (or not an allowed origin), uses FRONTEND_URL.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Hosts a development frontend may be served from over plain HTTP.
const LOCAL_DEV_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Whether `url` is the configured frontend or a local development origin.
///
/// Local origins must parse as `http://` with a host of exactly `localhost`
/// or `127.0.0.1` and no userinfo.
pub fn is_allowed_frontend(url: &str, frontend_url: &str) -> bool {
    if url == frontend_url {
        return true;
    }

    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    parsed.scheme() == "http"
        && parsed.username().is_empty()
        && parsed.password().is_none()
        && parsed
            .host_str()
            .is_some_and(|host| LOCAL_DEV_HOSTS.contains(&host))
}

/// Externally visible base URL of this service.
fn service_base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(public_url) = &state.config.public_url {
        return public_url.clone();
    }

    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost:8080");

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };
    format!("{}://{}", scheme, host)
}

/// Sign `frontend_url` and the current time into an OAuth `state` value.
pub fn sign_state(frontend_url: &str, key: &[u8]) -> Result<String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    // Payload: "frontend_url|timestamp_hex"
    let payload = format!("{}|{:x}", frontend_url, timestamp);

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the signature and age of an OAuth `state` value and return the
/// frontend URL it carries.
pub fn verify_state(state: &str, key: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "frontend_url|timestamp_hex|signature_hex"; split from the
    // right so a '|' inside the URL survives.
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let frontend_url = parts.next()?;

    let payload = format!("{}|{}", frontend_url, timestamp_hex);
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::warn!("OAuth state signature mismatch, possible tampering");
        return None;
    }

    let issued_ms = u128::from_str_radix(timestamp_hex, 16).ok()?;
    let now_ms = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_millis();
    if now_ms.saturating_sub(issued_ms) > STATE_MAX_AGE_MS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(frontend_url.to_string())
}

/// Start sign-in - redirect to Google's consent screen.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
    headers: HeaderMap,
) -> Result<Redirect> {
    let frontend_url = params
        .redirect_uri
        .filter(|url| is_allowed_frontend(url, &state.config.frontend_url))
        .unwrap_or_else(|| state.config.frontend_url.clone());

    let oauth_state = sign_state(&frontend_url, state.session_keys.oauth_state_key())?;
    let callback_url = format!("{}{}", service_base_url(&state, &headers), CALLBACK_PATH);
    let auth_url = state.google.authorize_url(&callback_url, &oauth_state);

    tracing::info!(
        client_id = %state.google.client_id(),
        frontend_url = %frontend_url,
        "Starting sign-in, redirecting to Google"
    );

    Ok(Redirect::temporary(&auth_url))
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

fn signin_error_redirect(frontend_url: &str, error: &str) -> Redirect {
    Redirect::temporary(&format!(
        "{}/signin?error={}",
        frontend_url,
        urlencoding::encode(error)
    ))
}

/// Build the session cookie. `Secure` whenever the frontend is served over HTTPS.
fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

/// OAuth callback - exchange code, sync the user upstream, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    // Decode and verify frontend URL from state parameter
    let frontend_url = params
        .state
        .as_deref()
        .and_then(|s| verify_state(s, state.session_keys.oauth_state_key()))
        .unwrap_or_else(|| state.config.frontend_url.clone());

    // Check for OAuth errors
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Ok((jar, signin_error_redirect(&frontend_url, &error)));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");

    let callback_url = format!("{}{}", service_base_url(&state, &headers), CALLBACK_PATH);
    let identity = async {
        let tokens = state.google.exchange_code(&code, &callback_url).await?;
        let profile = state.google.userinfo(&tokens.access_token).await?;
        Ok::<_, AppError>((tokens, profile))
    }
    .await;

    let (tokens, profile) = match identity {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!(error = %e, "Sign-in failed");
            return Ok((jar, signin_error_redirect(&frontend_url, "OAuthCallback")));
        }
    };

    let Some(email) = profile.email else {
        tracing::warn!(subject = %profile.sub, "Google identity has no email");
        return Ok((jar, signin_error_redirect(&frontend_url, "missing_email")));
    };

    let session = Session {
        user_email: email,
        user_name: profile.name.unwrap_or_default(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_at: tokens.expires_in.map(|secs| now_epoch_secs() + secs),
    };

    // Runs before the session exists; never blocks sign-in.
    complete_sign_in(&state.upstream, &session).await;

    let token = state.session_keys.issue(&session)?;
    let secure = state.config.frontend_url.starts_with("https://");

    tracing::info!(email = %session.user_email, "Sign-in complete, session issued");

    Ok((
        jar.add(session_cookie(token, secure)),
        Redirect::temporary(&format!("{}/dashboard", frontend_url)),
    ))
}

/// Sign out - remove the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

/// Current session, as visible to the dashboard.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub email: String,
    pub name: String,
    pub expires_at: Option<i64>,
    pub has_refresh_token: bool,
}

async fn get_session(Extension(session): Extension<Session>) -> Json<SessionResponse> {
    Json(SessionResponse {
        email: session.user_email,
        name: session.user_name,
        expires_at: session.expires_at,
        has_refresh_token: session.refresh_token.is_some(),
    })
}
