// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated backend gateway.
//!
//! `GET|POST|PUT|DELETE /api/backend/{*path}` is re-issued against the
//! upstream briefing API with the server-held API key injected, and the
//! upstream status and body are relayed back. HEAD is refused with 405.
//! Order of checks:
//!
//! 1. Session required unless the first segment is public (401, no upstream call)
//! 2. Path segments must be plain names (400, no upstream call)
//! 3. First segment must be a known upstream resource (404, no upstream call)

use crate::error::{AppError, Result};
use crate::middleware::auth::resolve_session;
use crate::services::upstream::{resources, UpstreamBody, UpstreamResponse};
use crate::services::Session;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;
use std::sync::Arc;

/// Mount point of the gateway.
const GATEWAY_PREFIX: &str = "/api/backend/";

/// Methods the gateway forwards.
const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE";

/// Gateway routes. Session checks happen per request in the handler
/// because part of the address space is public.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/backend/{*path}",
        get(forward).post(forward).put(forward).delete(forward),
    )
}

/// Whether a forwarded path is reachable without a session.
pub fn is_public_route<S: AsRef<str>>(segments: &[S]) -> bool {
    segments
        .first()
        .is_some_and(|first| resources::PUBLIC.contains(&first.as_ref()))
}

/// Split the raw request path below the gateway prefix, then decode each
/// segment on its own. An encoded `/` stays inside its segment.
fn decode_segments(uri: &Uri) -> Result<Vec<String>> {
    let raw = uri.path().strip_prefix(GATEWAY_PREFIX).unwrap_or_default();
    raw.split('/')
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .map_err(|_| AppError::InvalidPath(raw.to_string()))
        })
        .collect()
}

/// Reject segments that could escape the resource they name.
fn validate_segments<S: AsRef<str>>(segments: &[S]) -> Result<()> {
    for segment in segments.iter().map(AsRef::as_ref) {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
            let joined: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
            return Err(AppError::InvalidPath(joined.join("/")));
        }
    }
    Ok(())
}

/// Parse an inbound JSON body. Missing or malformed bodies are dropped,
/// leaving validation to the upstream.
fn inbound_json(body: &Bytes) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "Dropping malformed request body");
            None
        }
    }
}

async fn forward(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    RawQuery(query): RawQuery,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    // `get` also answers HEAD
    if method == Method::HEAD {
        return Ok((
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, ALLOWED_METHODS)],
        )
            .into_response());
    }

    let session = resolve_session(&jar, &headers, &state.session_keys);
    let segments = decode_segments(&uri);

    let public = segments.as_deref().is_ok_and(is_public_route);
    if session.is_none() && !public {
        tracing::debug!(path = %uri.path(), "Rejecting gateway request without session");
        return Err(AppError::Unauthorized);
    }

    let segments = segments?;
    validate_segments(&segments)?;

    if !resources::FORWARDED.contains(&segments[0].as_str()) {
        return Err(AppError::NotFound(segments[0].clone()));
    }

    let body = if method == Method::POST || method == Method::PUT {
        inbound_json(&body)
    } else {
        None
    };

    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
    relay(&state, session.as_ref(), method, &segments, query.as_deref(), body).await
}

/// Issue the upstream call on behalf of `session` and mirror its outcome.
async fn relay(
    state: &AppState,
    session: Option<&Session>,
    method: Method,
    segments: &[&str],
    query: Option<&str>,
    body: Option<Value>,
) -> Result<Response> {
    let caller = session.map(|s| s.user_email.as_str()).unwrap_or("<anonymous>");

    match state.upstream.forward(method.clone(), segments, query, body).await {
        Ok(upstream) => {
            tracing::debug!(
                caller,
                method = %method,
                status = upstream.status.as_u16(),
                "Upstream responded"
            );
            Ok(into_response(upstream))
        }
        Err(e) => {
            tracing::warn!(caller, method = %method, error = %format!("{e:#}"), "Backend proxy error");
            Err(AppError::UpstreamUnavailable)
        }
    }
}

/// Mirror the upstream status; non-JSON text is wrapped as a JSON string.
fn into_response(upstream: UpstreamResponse) -> Response {
    match upstream.body {
        UpstreamBody::Empty => upstream.status.into_response(),
        UpstreamBody::Json(value) => (upstream.status, Json(value)).into_response(),
        UpstreamBody::Text(text) => (upstream.status, Json(Value::String(text))).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_route() {
        assert!(is_public_route(&["health"]));
        assert!(is_public_route(&["health", "deep"]));
        assert!(!is_public_route(&["users"]));
        assert!(!is_public_route(&["healthz"]));
        assert!(!is_public_route::<&str>(&[]));
    }

    #[test]
    fn test_decode_segments_keeps_encoded_slash() {
        let uri: Uri = "/api/backend/users/a%2Fcalendar/x%20y".parse().unwrap();
        assert_eq!(
            decode_segments(&uri).unwrap(),
            vec!["users", "a/calendar", "x y"]
        );

        let uri: Uri = "/api/backend/users/%FF".parse().unwrap();
        assert!(decode_segments(&uri).is_err());
    }

    #[test]
    fn test_validate_segments() {
        assert!(validate_segments(&["users", "42", "calendar"]).is_ok());
        assert!(validate_segments(&["users", "..", "admin"]).is_err());
        assert!(validate_segments(&["users", "."]).is_err());
        assert!(validate_segments(&["users", ""]).is_err());
        assert!(validate_segments(&["users", "a\\b"]).is_err());
    }

    #[test]
    fn test_inbound_json() {
        assert_eq!(inbound_json(&Bytes::new()), None);
        assert_eq!(inbound_json(&Bytes::from_static(b"{not json")), None);
        assert_eq!(
            inbound_json(&Bytes::from_static(b"{\"include_news\":false}")),
            Some(serde_json::json!({ "include_news": false }))
        );
    }
}
