// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the upstream briefing backend.
//!
//! Every request carries `Content-Type: application/json` and, when
//! configured, the server-held `X-API-Key`. Nothing from the browser's own
//! headers is ever copied onto an upstream request.

use crate::models::UserCreate;
use anyhow::Context;
use reqwest::{header, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::{form_urlencoded, Url};

/// Header carrying the server-held upstream credential.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Upstream resource prefixes (first path segment).
pub mod resources {
    pub const USERS: &str = "users";
    pub const PREFERENCES: &str = "preferences";
    pub const BRIEFING: &str = "briefing";
    pub const HEALTH: &str = "health";

    /// Every prefix the gateway forwards.
    pub const FORWARDED: [&str; 4] = [USERS, PREFERENCES, BRIEFING, HEALTH];

    /// Prefixes reachable without a session.
    pub const PUBLIC: [&str; 1] = [HEALTH];
}

/// Decoded upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: UpstreamBody,
}

/// Upstream response body, classified by content type.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// No body bytes, whatever the status or content type
    Empty,
    Json(Value),
    Text(String),
}

/// Upstream backend client.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl UpstreamClient {
    /// Create a client for `base_url` with a per-call deadline of `timeout`.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid upstream base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("upstream base URL must be http(s): {base_url}");
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building upstream HTTP client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join `segments` onto the base URL and append the query pairs of
    /// `raw_query` in their original order.
    ///
    /// Segments are percent-encoded, so a segment can never introduce a
    /// new path level.
    pub fn target_url(&self, segments: &[&str], raw_query: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        if let Some(query) = raw_query {
            let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect();
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }

        url
    }

    /// Start a request with the upstream headers applied.
    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json");
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// Issue `method` against the joined path and decode the response.
    ///
    /// `Err` means the call could not be completed at all (connect failure,
    /// timeout, or a JSON-typed body that does not decode). Any HTTP status,
    /// success or not, is returned as `Ok`.
    pub async fn forward(
        &self,
        method: Method,
        segments: &[&str],
        raw_query: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<UpstreamResponse> {
        let url = self.target_url(segments, raw_query);
        tracing::debug!(method = %method, url = %url, "Forwarding to upstream");

        let mut request = self.request(method, url);
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send().await.context("upstream request failed")?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let bytes = response
            .bytes()
            .await
            .context("failed reading upstream body")?;

        let body = if bytes.is_empty() {
            UpstreamBody::Empty
        } else if is_json {
            UpstreamBody::Json(
                serde_json::from_slice(&bytes).context("upstream sent undecodable JSON")?,
            )
        } else {
            UpstreamBody::Text(String::from_utf8_lossy(&bytes).into_owned())
        };

        Ok(UpstreamResponse { status, body })
    }

    /// `POST /users`: create-or-update the user keyed by email.
    pub async fn create_user(&self, body: &UserCreate) -> Result<reqwest::Response, reqwest::Error> {
        let url = self.target_url(&[resources::USERS], None);
        self.request(Method::POST, url).json(body).send().await
    }
}
