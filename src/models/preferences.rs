// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Briefing preferences model (one-to-one with a user).

use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Languages the briefing can be read in.
pub const SUPPORTED_LANGUAGES: [&str; 14] = [
    "English",
    "Spanish",
    "French",
    "German",
    "Italian",
    "Portuguese",
    "Chinese",
    "Japanese",
    "Korean",
    "Arabic",
    "Hindi",
    "Russian",
    "Dutch",
    "Polish",
];

/// Language used before preferences are configured.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Briefing preferences stored by the upstream backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserPreferences {
    pub id: String,
    pub user_id: String,
    pub news_topic_1: Option<String>,
    pub news_topic_2: Option<String>,
    pub additional_context: Option<String>,
    pub preferred_language: String,
    pub include_calendar: bool,
    pub include_weather: bool,
    pub include_news: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update of preferences (`PUT /preferences/{user_id}`).
///
/// Nullable text fields are tri-state: `None` leaves the field alone,
/// `Some(None)` clears it, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PreferencesUpdate {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub news_topic_1: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub news_topic_2: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "nullable"
    )]
    pub additional_context: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_calendar: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_weather: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_news: Option<bool>,
}

/// A present-but-null field deserializes to `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Content sections that can be switched on or off in a briefing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BriefingContent {
    Calendar,
    Weather,
    News,
}

impl BriefingContent {
    /// Current value of this switch in `prefs`.
    pub fn get(self, prefs: &UserPreferences) -> bool {
        match self {
            BriefingContent::Calendar => prefs.include_calendar,
            BriefingContent::Weather => prefs.include_weather,
            BriefingContent::News => prefs.include_news,
        }
    }

    pub fn set(self, prefs: &mut UserPreferences, value: bool) {
        match self {
            BriefingContent::Calendar => prefs.include_calendar = value,
            BriefingContent::Weather => prefs.include_weather = value,
            BriefingContent::News => prefs.include_news = value,
        }
    }

    /// Update body touching only this switch.
    pub fn update(self, value: bool) -> PreferencesUpdate {
        let mut update = PreferencesUpdate::default();
        match self {
            BriefingContent::Calendar => update.include_calendar = Some(value),
            BriefingContent::Weather => update.include_weather = Some(value),
            BriefingContent::News => update.include_news = Some(value),
        }
        update
    }
}
