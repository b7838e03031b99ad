// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model as served by the upstream backend.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// E.164 phone number, leading `+` optional.
pub static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone number pattern is valid")
});

/// User record owned by the upstream backend (keyed by email).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub is_active: bool,
    /// Older backends omit this field.
    #[serde(default)]
    pub has_calendar_connected: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of `POST /users` (idempotent upsert keyed by email).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_refresh_token: Option<String>,
    /// RFC 3339 expiry of the access token. Sent as `null` when unknown.
    pub token_expires_at: Option<String>,
}

/// Partial update of a user (`PUT /users/{id}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *PHONE_NUMBER, message = "Invalid phone number format (E.164)"))]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, message = "Location must be at least 2 characters"))]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Calendar credentials sub-resource (`PUT /users/{id}/calendar`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalendarTokenUpdate {
    pub google_access_token: String,
    pub google_refresh_token: String,
    pub token_expires_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_number_pattern() {
        for ok in ["+14155550123", "14155550123", "+447911123456", "+12"] {
            assert!(PHONE_NUMBER.is_match(ok), "{ok} should match");
        }
        for bad in ["", "+", "+0123456", "555-0123", "+1234567890123456", "phone"] {
            assert!(!PHONE_NUMBER.is_match(bad), "{bad} should not match");
        }
    }

    #[test]
    fn test_user_update_validation() {
        let update = UserUpdate {
            name: Some("A".to_string()),
            phone_number: Some("12-34".to_string()),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("phone_number"));
        assert!(!fields.contains_key("location"));

        assert!(UserUpdate::default().validate().is_ok());
    }

    #[test]
    fn test_user_update_skips_absent_fields() {
        let update = UserUpdate {
            location: Some("Oslo".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "location": "Oslo" })
        );
    }

    #[test]
    fn test_user_without_calendar_flag() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "a@example.com",
            "name": "Ada",
            "phone_number": null,
            "location": null,
            "timezone": null,
            "is_active": true,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(!user.has_calendar_connected);
    }
}
