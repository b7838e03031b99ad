// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google;
pub mod session;
pub mod signin;
pub mod upstream;

pub use google::{GoogleEndpoints, GoogleOAuthClient, GoogleProfile, TokenResponse};
pub use session::{Session, SessionKeys, SESSION_COOKIE};
pub use signin::{complete_sign_in, SignInSync};
pub use upstream::{UpstreamBody, UpstreamClient, UpstreamResponse};
