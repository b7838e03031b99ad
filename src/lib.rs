// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Briefing Gateway: sign-in and backend gateway for the daily briefing dashboard.
//!
//! This crate provides the server side of the dashboard (Google sign-in,
//! session handling, and the authenticated gateway to the briefing backend)
//! plus the typed client the dashboard uses to talk to that gateway.

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{GoogleEndpoints, GoogleOAuthClient, SessionKeys, UpstreamClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub upstream: UpstreamClient,
    pub google: GoogleOAuthClient,
    pub session_keys: SessionKeys,
}

impl AppState {
    /// Build the shared state from configuration.
    pub fn new(config: Config, google_endpoints: GoogleEndpoints) -> anyhow::Result<Self> {
        let upstream = UpstreamClient::new(
            &config.api_url,
            config.api_key.clone(),
            config.upstream_timeout,
        )?;
        let google = GoogleOAuthClient::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            google_endpoints,
        )?;
        let session_keys = SessionKeys::new(&config.session_secret)?;

        Ok(Self {
            config,
            upstream,
            google,
            session_keys,
        })
    }
}
