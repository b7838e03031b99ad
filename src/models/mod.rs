// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the upstream briefing API.

pub mod briefing;
pub mod preferences;
pub mod user;

pub use briefing::{BriefingPreview, HealthStatus};
pub use preferences::{BriefingContent, PreferencesUpdate, UserPreferences};
pub use user::{CalendarTokenUpdate, User, UserCreate, UserUpdate};
