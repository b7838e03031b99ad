// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets (upstream API key, OAuth client secret, session secret) are read
//! once at startup and held in memory; none of them is ever sent to the browser.

use std::env;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Base URL of the upstream briefing backend (e.g. `http://localhost:8000/api/v1`)
    pub api_url: String,
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Frontend URL for post-sign-in redirects and CORS
    pub frontend_url: String,
    /// Externally visible base URL of this service, used for the OAuth callback.
    /// When unset, the callback URL is derived from the request `Host` header.
    pub public_url: Option<String>,
    /// Server port
    pub port: u16,
    /// Deadline for every upstream call
    pub upstream_timeout: Duration,

    // --- Secrets ---
    /// Upstream API key injected as `X-API-Key`. `None` means calls go out unauthenticated.
    pub api_key: Option<String>,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Secret for session token signing and token sealing (raw bytes)
    pub session_secret: Vec<u8>,
}

impl Config {
    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            api_url: "http://127.0.0.1:9/api/v1".to_string(),
            google_client_id: "test_client_id".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            public_url: Some("http://localhost:8080".to_string()),
            port: 8080,
            upstream_timeout: Duration::from_secs(5),
            api_key: Some("test_api_key".to_string()),
            google_client_secret: "test_secret".to_string(),
            session_secret: b"test_session_secret_32_bytes!!!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let upstream_timeout_secs = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("UPSTREAM_TIMEOUT_SECS", v))?,
            Err(_) => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        let api_key = env::var("API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if api_key.is_none() {
            tracing::warn!("API_KEY not set, upstream calls will be unauthenticated");
        }

        Ok(Self {
            api_url: env::var("API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            public_url: env::var("PUBLIC_URL")
                .ok()
                .map(|v| v.trim_end_matches('/').to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),

            api_key,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            session_secret: env::var("SESSION_SECRET")
                .map_err(|_| ConfigError::Missing("SESSION_SECRET"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
