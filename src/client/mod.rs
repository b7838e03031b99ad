// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed client for the backend gateway.
//!
//! One method per upstream resource, all going through `/api/backend`.
//! Every failure, whether an upstream error status, an undecodable body, or
//! a transport error, surfaces as a single [`ApiException`].

pub mod dashboard;

use crate::models::{
    BriefingPreview, CalendarTokenUpdate, HealthStatus, PreferencesUpdate, User, UserCreate,
    UserPreferences, UserUpdate,
};
use crate::services::session::SESSION_COOKIE;
use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Message used when an error response carries nothing more specific.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Status reported for failures that produced no HTTP response.
const TRANSPORT_ERROR_STATUS: u16 = 500;

/// The one error shape of the API client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (HTTP {status})")]
pub struct ApiException {
    pub message: String,
    pub status: u16,
}

impl ApiException {
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    fn transport(err: impl std::fmt::Display) -> Self {
        Self::new(err.to_string(), TRANSPORT_ERROR_STATUS)
    }
}

/// Pick the most specific message from an error body: `detail`, then
/// `error`, then `message`, then [`DEFAULT_ERROR_MESSAGE`].
pub fn error_message(body: &Value) -> String {
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| match body.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null | Value::Bool(false) | Value::String(_) => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}

/// Client for the gateway at `base_url` (e.g. `https://app.example.com/api/backend`).
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: None,
        }
    }

    /// Attach the caller's session token, sent as the session cookie.
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn users(&self) -> Users<'_> {
        Users(self)
    }

    pub fn preferences(&self) -> Preferences<'_> {
        Preferences(self)
    }

    pub fn briefing(&self) -> Briefing<'_> {
        Briefing(self)
    }

    pub fn health(&self) -> Health<'_> {
        Health(self)
    }

    fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, ApiException> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(ApiException::transport)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Send a request and turn any non-2xx status into an [`ApiException`].
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<reqwest::Response, ApiException> {
        let url = self.url(endpoint, params)?;

        let mut request = self
            .http
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = &self.session_token {
            request = request.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send().await.map_err(ApiException::transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .json::<Value>()
                .await
                .unwrap_or_else(|_| Value::Object(Default::default()));
            return Err(ApiException::new(error_message(&body), status));
        }

        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<T, ApiException> {
        let response = self.send(method, endpoint, params, body).await?;

        // 204 yields an empty object
        if response.status() == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Object(Default::default()))
                .map_err(ApiException::transport);
        }

        response.json::<T>().await.map_err(ApiException::transport)
    }

    async fn fetch_empty(&self, method: Method, endpoint: &str) -> Result<(), ApiException> {
        self.send(method, endpoint, &[], None).await.map(|_| ())
    }
}

fn json_body(data: &impl Serialize) -> Result<Option<Value>, ApiException> {
    serde_json::to_value(data)
        .map(Some)
        .map_err(ApiException::transport)
}

fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

/// `/users` resource.
pub struct Users<'a>(&'a ApiClient);

impl Users<'_> {
    pub async fn create(&self, data: &UserCreate) -> Result<User, ApiException> {
        self.0
            .fetch(Method::POST, "/users", &[], json_body(data)?)
            .await
    }

    pub async fn get(&self, user_id: &str) -> Result<User, ApiException> {
        self.0
            .fetch(Method::GET, &format!("/users/{}", segment(user_id)), &[], None)
            .await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, ApiException> {
        self.0
            .fetch(Method::GET, "/users", &[("email", email)], None)
            .await
    }

    pub async fn update(&self, user_id: &str, data: &UserUpdate) -> Result<User, ApiException> {
        self.0
            .fetch(
                Method::PUT,
                &format!("/users/{}", segment(user_id)),
                &[],
                json_body(data)?,
            )
            .await
    }

    pub async fn delete(&self, user_id: &str) -> Result<(), ApiException> {
        self.0
            .fetch_empty(Method::DELETE, &format!("/users/{}", segment(user_id)))
            .await
    }

    pub async fn update_calendar_tokens(
        &self,
        user_id: &str,
        data: &CalendarTokenUpdate,
    ) -> Result<User, ApiException> {
        self.0
            .fetch(
                Method::PUT,
                &format!("/users/{}/calendar", segment(user_id)),
                &[],
                json_body(data)?,
            )
            .await
    }

    pub async fn disconnect_calendar(&self, user_id: &str) -> Result<User, ApiException> {
        self.0
            .fetch(
                Method::DELETE,
                &format!("/users/{}/calendar", segment(user_id)),
                &[],
                None,
            )
            .await
    }
}

/// `/preferences` resource.
pub struct Preferences<'a>(&'a ApiClient);

impl Preferences<'_> {
    pub async fn get(&self, user_id: &str) -> Result<UserPreferences, ApiException> {
        self.0
            .fetch(
                Method::GET,
                &format!("/preferences/{}", segment(user_id)),
                &[],
                None,
            )
            .await
    }

    pub async fn update(
        &self,
        user_id: &str,
        data: &PreferencesUpdate,
    ) -> Result<UserPreferences, ApiException> {
        self.0
            .fetch(
                Method::PUT,
                &format!("/preferences/{}", segment(user_id)),
                &[],
                json_body(data)?,
            )
            .await
    }
}

/// `/briefing` resource.
pub struct Briefing<'a>(&'a ApiClient);

impl Briefing<'_> {
    pub async fn preview(&self, user_id: &str) -> Result<BriefingPreview, ApiException> {
        self.0
            .fetch(
                Method::GET,
                &format!("/briefing/preview/{}", segment(user_id)),
                &[],
                None,
            )
            .await
    }
}

/// `/health` resource.
pub struct Health<'a>(&'a ApiClient);

impl Health<'_> {
    pub async fn check(&self) -> Result<HealthStatus, ApiException> {
        self.0.fetch(Method::GET, "/health", &[], None).await
    }
}
