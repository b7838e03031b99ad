// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in completion hook.
//!
//! Runs once per successful federated sign-in, before the session cookie is
//! issued, and upserts the user record in the upstream backend together with
//! the freshly issued Google tokens. It talks to the upstream directly with
//! the server-held API key rather than through the gateway.
//!
//! The sync is best-effort: a failure is logged and sign-in still completes.
//! The dashboard notices the missing user record on its next load and asks
//! for the setup fields again.

use crate::models::UserCreate;
use crate::services::session::Session;
use crate::services::upstream::UpstreamClient;
use crate::time_utils::epoch_to_rfc3339;
use reqwest::StatusCode;

/// Outcome of syncing a signed-in identity to the upstream backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInSync {
    Created,
    /// Upstream answered 400, which it uses for "user already exists".
    AlreadyExists,
    /// Sync failed; sign-in proceeds anyway.
    Failed(String),
}

impl SignInSync {
    pub fn is_synced(&self) -> bool {
        !matches!(self, SignInSync::Failed(_))
    }
}

/// Upsert body for a fresh session.
pub fn user_create_body(session: &Session) -> UserCreate {
    UserCreate {
        email: session.user_email.clone(),
        name: session.user_name.clone(),
        google_access_token: Some(session.access_token.clone()),
        google_refresh_token: session.refresh_token.clone(),
        token_expires_at: session.expires_at.and_then(epoch_to_rfc3339),
        ..Default::default()
    }
}

/// Sync the signed-in user to the upstream backend. Never fails.
pub async fn complete_sign_in(upstream: &UpstreamClient, session: &Session) -> SignInSync {
    let body = user_create_body(session);

    let outcome = match upstream.create_user(&body).await {
        Ok(response) if response.status().is_success() => SignInSync::Created,
        Ok(response) if response.status() == StatusCode::BAD_REQUEST => SignInSync::AlreadyExists,
        Ok(response) => {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            SignInSync::Failed(format!("HTTP {}: {}", status, detail))
        }
        Err(e) => SignInSync::Failed(e.to_string()),
    };

    match &outcome {
        SignInSync::Failed(reason) => tracing::error!(
            email = %session.user_email,
            error = %reason,
            "Failed to create/update user in backend"
        ),
        synced => tracing::info!(
            email = %session.user_email,
            outcome = ?synced,
            "User synced with backend"
        ),
    }

    outcome
}
