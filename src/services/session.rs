// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session/token store.
//!
//! A signed-in browser carries its session as an HS256 JWT in an HttpOnly
//! cookie. The upstream (Google) access/refresh token pair travels inside the
//! JWT sealed with AES-256-GCM, so the browser can hold it without being able
//! to read it. The sealing key is derived from the session secret with
//! HKDF-SHA256 and the sealed blob is bound to the user's email as AAD.
//!
//! Token refresh is not implemented: once the upstream access token expires
//! it stays expired until the user signs in again.

use anyhow::anyhow;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hkdf::Hkdf;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "briefing_session";

/// Session lifetime (30 days).
pub const SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

const HKDF_SALT: &[u8] = b"briefing-gateway/v1";
const SEAL_INFO: &[u8] = b"session token seal";
const OAUTH_STATE_INFO: &[u8] = b"oauth state mac";

/// An authenticated browser session.
///
/// Created on successful sign-in and never mutated afterwards. Handlers
/// receive it as an explicit parameter.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub user_email: String,
    pub user_name: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Upstream access token expiry (Unix seconds).
    pub expires_at: Option<i64>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_email", &self.user_email)
            .field("user_name", &self.user_name)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// JWT claims of the session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Subject (user email)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Sealed upstream token pair
    pub tok: String,
    /// Upstream access token expiry (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_exp: Option<i64>,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

#[derive(Serialize, Deserialize)]
struct SealedTokens {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// Keys for issuing and reading session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    seal: LessSafeKey,
    oauth_state_key: [u8; 32],
    rng: SystemRandom,
}

/// Derive a 32-byte subkey of `secret` for the purpose named by `info`.
fn derive_key(secret: &[u8], info: &[u8]) -> anyhow::Result<[u8; 32]> {
    let mut okm = [0u8; 32];
    Hkdf::<Sha256>::new(Some(HKDF_SALT), secret)
        .expand(info, &mut okm)
        .map_err(|e| anyhow!("HKDF expand failed: {}", e))?;
    Ok(okm)
}

impl SessionKeys {
    /// Derive all session keys from the configured secret.
    pub fn new(secret: &[u8]) -> anyhow::Result<Self> {
        if secret.len() < 32 {
            anyhow::bail!("session secret must be at least 32 bytes");
        }

        let unbound = UnboundKey::new(&AES_256_GCM, &derive_key(secret, SEAL_INFO)?)
            .map_err(|_| anyhow!("failed to build sealing key"))?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            seal: LessSafeKey::new(unbound),
            oauth_state_key: derive_key(secret, OAUTH_STATE_INFO)?,
            rng: SystemRandom::new(),
        })
    }

    /// MAC key for the OAuth `state` parameter.
    pub fn oauth_state_key(&self) -> &[u8] {
        &self.oauth_state_key
    }

    /// Issue a signed session token for `session`.
    pub fn issue(&self, session: &Session) -> anyhow::Result<String> {
        use std::time::{SystemTime, UNIX_EPOCH};

        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let claims = SessionClaims {
            sub: session.user_email.clone(),
            name: session.user_name.clone(),
            tok: self.seal_tokens(session)?,
            upstream_exp: session.expires_at,
            iat: now as usize,
            exp: (now + SESSION_TTL_SECS) as usize,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Read a session token. Any failure (signature, expiry, sealing) means no session.
    pub fn read(&self, token: &str) -> Option<Session> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<SessionClaims>(token, &self.decoding, &validation)
            .ok()?
            .claims;

        let tokens = self.open_tokens(&claims.tok, &claims.sub)?;

        Some(Session {
            user_email: claims.sub,
            user_name: claims.name,
            access_token: tokens.access,
            refresh_token: tokens.refresh,
            expires_at: claims.upstream_exp,
        })
    }

    fn seal_tokens(&self, session: &Session) -> anyhow::Result<String> {
        let plaintext = serde_json::to_vec(&SealedTokens {
            access: session.access_token.clone(),
            refresh: session.refresh_token.clone(),
        })?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| anyhow!("random nonce generation failed"))?;

        let mut in_out = plaintext;
        self.seal
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::from(session.user_email.as_bytes()),
                &mut in_out,
            )
            .map_err(|_| anyhow!("token sealing failed"))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + in_out.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&in_out);
        Ok(URL_SAFE_NO_PAD.encode(blob))
    }

    fn open_tokens(&self, sealed: &str, email: &str) -> Option<SealedTokens> {
        let blob = URL_SAFE_NO_PAD.decode(sealed).ok()?;
        if blob.len() < NONCE_LEN {
            return None;
        }
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce).ok()?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .seal
            .open_in_place(nonce, Aad::from(email.as_bytes()), &mut in_out)
            .ok()?;
        serde_json::from_slice(plaintext).ok()
    }
}
