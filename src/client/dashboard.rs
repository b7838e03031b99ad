// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard bootstrap and settings forms.
//!
//! All calls are made one after another; nothing here runs concurrently.
//! Form input is validated before any network call. Switches and the
//! language picker update the local copy first and roll it back if the
//! upstream rejects the change.

use super::{ApiClient, ApiException};
use crate::models::preferences::SUPPORTED_LANGUAGES;
use crate::models::user::PHONE_NUMBER;
use crate::models::{
    BriefingContent, CalendarTokenUpdate, PreferencesUpdate, User, UserCreate, UserPreferences,
    UserUpdate,
};
use crate::services::Session;
use crate::time_utils::epoch_to_rfc3339;
use validator::{Validate, ValidationErrors};

/// What the dashboard shows after loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    /// No backend user yet: ask for the setup fields first.
    NeedsSetup,
    Ready {
        user: User,
        /// `None` until preferences have been configured.
        preferences: Option<UserPreferences>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error(transparent)]
    Api(#[from] ApiException),
}

/// Who is completing setup, with the tokens from their sign-in if any.
#[derive(Debug, Clone, Default)]
pub struct SetupIdentity {
    pub email: String,
    pub name: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
}

impl From<&Session> for SetupIdentity {
    fn from(session: &Session) -> Self {
        Self {
            email: session.user_email.clone(),
            name: session.user_name.clone(),
            access_token: Some(session.access_token.clone()),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at,
        }
    }
}

impl SetupIdentity {
    fn calendar_tokens(&self) -> Option<CalendarTokenUpdate> {
        Some(CalendarTokenUpdate {
            google_access_token: self.access_token.clone()?,
            google_refresh_token: self.refresh_token.clone()?,
            token_expires_at: epoch_to_rfc3339(self.expires_at?)?,
        })
    }
}

/// First-run setup form.
#[derive(Debug, Clone, Default, Validate)]
pub struct SetupForm {
    #[validate(
        required(message = "Phone number is required"),
        regex(path = *PHONE_NUMBER, message = "Invalid phone number format (E.164)")
    )]
    pub phone_number: Option<String>,
    #[validate(length(min = 2, message = "Location must be at least 2 characters"))]
    pub location: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load the signed-in user's dashboard.
pub async fn load_dashboard(client: &ApiClient, email: &str) -> Dashboard {
    let user = match client.users().get_by_email(email).await {
        Ok(user) => user,
        Err(e) => {
            tracing::info!(email, error = %e, "No backend user, setup required");
            return Dashboard::NeedsSetup;
        }
    };

    let preferences = match client.preferences().get(&user.id).await {
        Ok(prefs) => Some(prefs),
        Err(e) => {
            tracing::debug!(user_id = %user.id, error = %e, "No preferences found yet");
            None
        }
    };

    Dashboard::Ready { user, preferences }
}

/// Create the backend user from the setup form, then store calendar tokens.
///
/// Token storage is best-effort: its failure is logged and the created
/// user is still returned.
pub async fn complete_setup(
    client: &ApiClient,
    identity: &SetupIdentity,
    form: SetupForm,
) -> Result<User, DashboardError> {
    let form = SetupForm {
        phone_number: non_blank(form.phone_number),
        location: non_blank(form.location),
    };
    form.validate()?;

    let user = client
        .users()
        .create(&UserCreate {
            email: identity.email.clone(),
            name: identity.name.clone(),
            phone_number: form.phone_number,
            location: form.location,
            ..Default::default()
        })
        .await?;

    if let Some(tokens) = identity.calendar_tokens() {
        if let Err(e) = client.users().update_calendar_tokens(&user.id, &tokens).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to store calendar tokens");
        }
    }

    tracing::info!(user_id = %user.id, "Account setup complete");
    Ok(user)
}

/// Validate and apply a profile change.
pub async fn update_profile(
    client: &ApiClient,
    user_id: &str,
    update: &UserUpdate,
) -> Result<User, DashboardError> {
    update.validate()?;
    Ok(client.users().update(user_id, update).await?)
}

/// Save both news topics; blank topics are cleared.
pub async fn set_news_topics(
    client: &ApiClient,
    user_id: &str,
    topic_1: &str,
    topic_2: &str,
) -> Result<UserPreferences, ApiException> {
    let update = PreferencesUpdate {
        news_topic_1: Some(non_blank(Some(topic_1.to_string()))),
        news_topic_2: Some(non_blank(Some(topic_2.to_string()))),
        ..Default::default()
    };
    client.preferences().update(user_id, &update).await
}

/// Save the free-form context; blank context is cleared.
pub async fn set_additional_context(
    client: &ApiClient,
    user_id: &str,
    context: &str,
) -> Result<UserPreferences, ApiException> {
    let update = PreferencesUpdate {
        additional_context: Some(non_blank(Some(context.to_string()))),
        ..Default::default()
    };
    client.preferences().update(user_id, &update).await
}

/// Switch a briefing section on or off.
pub async fn toggle_content(
    client: &ApiClient,
    prefs: &mut UserPreferences,
    content: BriefingContent,
    value: bool,
) -> Result<(), ApiException> {
    let previous = content.get(prefs);
    content.set(prefs, value);

    match client
        .preferences()
        .update(&prefs.user_id, &content.update(value))
        .await
    {
        Ok(updated) => {
            *prefs = updated;
            Ok(())
        }
        Err(e) => {
            content.set(prefs, previous);
            Err(e)
        }
    }
}

/// Change the briefing language.
pub async fn set_language(
    client: &ApiClient,
    prefs: &mut UserPreferences,
    language: &str,
) -> Result<(), DashboardError> {
    if !SUPPORTED_LANGUAGES.contains(&language) {
        return Err(DashboardError::UnsupportedLanguage(language.to_string()));
    }

    let previous = std::mem::replace(&mut prefs.preferred_language, language.to_string());
    let update = PreferencesUpdate {
        preferred_language: Some(language.to_string()),
        ..Default::default()
    };

    match client.preferences().update(&prefs.user_id, &update).await {
        Ok(updated) => {
            *prefs = updated;
            Ok(())
        }
        Err(e) => {
            prefs.preferred_language = previous;
            Err(e.into())
        }
    }
}
