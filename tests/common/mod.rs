// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::{to_bytes, Body};
use axum::response::Response;
use briefing_gateway::config::Config;
use briefing_gateway::routes::create_router;
use briefing_gateway::services::{GoogleEndpoints, Session};
use briefing_gateway::AppState;
use std::sync::Arc;

/// Config pointing the upstream at `upstream_uri` (a mock server URI).
#[allow(dead_code)]
pub fn test_config(upstream_uri: &str) -> Config {
    let mut config = Config::test_default();
    config.api_url = format!("{}/api/v1", upstream_uri);
    config
}

/// Google endpoints served by a mock server.
#[allow(dead_code)]
pub fn google_endpoints(google_uri: &str) -> GoogleEndpoints {
    GoogleEndpoints {
        authorize_url: format!("{}/o/oauth2/v2/auth", google_uri),
        token_url: format!("{}/token", google_uri),
        userinfo_url: format!("{}/userinfo", google_uri),
    }
}

/// Create a test app from an explicit config.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, google: GoogleEndpoints) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, google).expect("Failed to build test state"));
    (create_router(state.clone()), state)
}

/// Create a test app whose upstream is `upstream_uri`.
#[allow(dead_code)]
pub fn create_test_app(upstream_uri: &str) -> (axum::Router, Arc<AppState>) {
    create_test_app_with(test_config(upstream_uri), GoogleEndpoints::default())
}

#[allow(dead_code)]
pub fn test_session(email: &str) -> Session {
    Session {
        user_email: email.to_string(),
        user_name: "Test User".to_string(),
        access_token: "ya29.test-access".to_string(),
        refresh_token: Some("1//test-refresh".to_string()),
        expires_at: Some(1_900_000_000),
    }
}

/// A valid session token for `email`.
#[allow(dead_code)]
pub fn session_token(state: &AppState, email: &str) -> String {
    state
        .session_keys
        .issue(&test_session(email))
        .expect("Failed to issue session token")
}

/// `Cookie` header value carrying a session for `email`.
#[allow(dead_code)]
pub fn session_cookie(state: &AppState, email: &str) -> String {
    format!("briefing_session={}", session_token(state, email))
}

/// Serve `app` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_app(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A local URL nothing is listening on.
#[allow(dead_code)]
pub async fn unreachable_uri() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Body is not JSON")
}
