// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Briefing Gateway API Server
//!
//! Signs dashboard users in with Google and forwards their requests to the
//! daily briefing backend with the server-held API key attached.

use briefing_gateway::{config::Config, services::GoogleEndpoints, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        upstream = %config.api_url,
        upstream_timeout_secs = config.upstream_timeout.as_secs(),
        "Starting Briefing Gateway"
    );

    // Build shared state
    let state = Arc::new(
        AppState::new(config.clone(), GoogleEndpoints::default())
            .expect("Failed to initialize application state"),
    );

    // Build router
    let app = briefing_gateway::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("briefing_gateway=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
