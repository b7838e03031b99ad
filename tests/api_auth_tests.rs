// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gateway authorization and CORS tests.
//!
//! These tests verify that:
//! 1. Private gateway paths reject requests without a session and never reach the upstream
//! 2. The public `health` path reaches the upstream without a session
//! 3. Path hardening (bad segments, unknown resources) happens before any upstream call
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

/// Mount a catch-all that must never be hit.
async fn forbid_upstream_calls(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_private_paths_without_session_never_reach_upstream() {
    let upstream = MockServer::start().await;
    forbid_upstream_calls(&upstream).await;
    let (app, _) = common::create_test_app(&upstream.uri());

    let cases = [
        ("GET", "/api/backend/users?email=a%40b.com"),
        ("GET", "/api/backend/users/42"),
        ("PUT", "/api/backend/preferences/42"),
        ("DELETE", "/api/backend/users/42/calendar"),
        ("POST", "/api/backend/users"),
        ("GET", "/api/backend/briefing/preview/42"),
        ("GET", "/api/backend/healthz"),
        ("GET", "/api/backend/admin/secrets"),
        ("GET", "/api/backend/%2E%2E/health"),
    ];

    for (method, uri) in cases {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(
            common::body_json(response).await,
            serde_json::json!({ "error": "Unauthorized" })
        );
    }

    upstream.verify().await;
}

#[tokio::test]
async fn test_invalid_session_is_rejected() {
    let upstream = MockServer::start().await;
    forbid_upstream_calls(&upstream).await;
    let (app, _) = common::create_test_app(&upstream.uri());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/backend/users/42")
                .header(header::COOKIE, "briefing_session=invalid.token.here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    upstream.verify().await;
}

#[tokio::test]
async fn test_public_health_reaches_upstream_without_session() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "healthy",
            "timestamp": "2026-10-19T00:00:00Z"
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    let (app, _) = common::create_test_app(&upstream.uri());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/backend/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_session_via_bearer_header_reaches_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "42" })))
        .expect(1)
        .mount(&upstream)
        .await;
    let (app, state) = common::create_test_app(&upstream.uri());
    let token = common::session_token(&state, "ada@example.com");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/backend/users/42")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_path_hardening_with_session() {
    let upstream = MockServer::start().await;
    forbid_upstream_calls(&upstream).await;
    let (app, state) = common::create_test_app(&upstream.uri());
    let cookie = common::session_cookie(&state, "ada@example.com");

    let cases = [
        ("/api/backend/users/%2E%2E/admin", StatusCode::BAD_REQUEST),
        ("/api/backend/users//42", StatusCode::BAD_REQUEST),
        ("/api/backend/health/..%5C..", StatusCode::BAD_REQUEST),
        ("/api/backend/admin/secrets", StatusCode::NOT_FOUND),
        ("/api/backend/internal", StatusCode::NOT_FOUND),
    ];

    for (uri, expected) in cases {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "{uri}");
    }

    upstream.verify().await;
}

#[tokio::test]
async fn test_unsupported_method() {
    let upstream = MockServer::start().await;
    forbid_upstream_calls(&upstream).await;
    let (app, state) = common::create_test_app(&upstream.uri());

    for method in ["PATCH", "HEAD"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/api/backend/users/42")
                    .header(header::COOKIE, common::session_cookie(&state, "ada@example.com"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
    }

    // HEAD is refused even on the public path
    let response = app
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/api/backend/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    upstream.verify().await;
}

#[tokio::test]
async fn test_cors_preflight() {
    let upstream = MockServer::start().await;
    let (app, _) = common::create_test_app(&upstream.uri());

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/backend/preferences/42")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);

    // Should have CORS headers
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_gateway_health_no_auth_required() {
    let upstream = MockServer::start().await;
    let (app, _) = common::create_test_app(&upstream.uri());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Health should be accessible without auth
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["status"], "ok");
}
