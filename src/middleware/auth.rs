// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::services::session::{Session, SessionKeys, SESSION_COOKIE};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::error::AppError;

/// Resolve the caller's session from the session cookie, falling back to an
/// `Authorization: Bearer` header when the cookie is absent or unreadable.
pub fn resolve_session(jar: &CookieJar, headers: &HeaderMap, keys: &SessionKeys) -> Option<Session> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| keys.read(cookie.value()))
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .and_then(|token| keys.read(token))
        })
}

/// Middleware that requires a valid session and exposes it as an extension.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = resolve_session(&jar, request.headers(), &state.session_keys)
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
