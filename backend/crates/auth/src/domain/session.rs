//! Session Tokens
//!
//! The identity provider's session exactly as the browser keeps it in the
//! session cookie: JSON, base64url-encoded behind a `base64-` prefix.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use platform::cookie::{decode_cookie_value, encode_cookie_value};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Provider session
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    /// Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl SessionTokens {
    /// Fill in `expires_at` from `expires_in` when the provider left it out
    pub fn stamped(mut self, issued_at: DateTime<Utc>) -> Self {
        if self.expires_at.is_none() && self.expires_in > 0 {
            self.expires_at = Some(issued_at.timestamp().saturating_add(self.expires_in));
        }
        self
    }

    /// Access token expiry in unix seconds.
    ///
    /// Falls back to the token's own `exp` claim.
    pub fn expiry(&self) -> Option<i64> {
        self.expires_at.or_else(|| jwt_expiry(&self.access_token))
    }

    /// Whether the access token is expired or expires within `margin`.
    ///
    /// Sessions with no known expiry are not refreshed; the provider's
    /// verification call decides for them.
    pub fn is_expiring(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match self.expiry() {
            // Cookie contents are client-controlled
            Some(expires_at) => expires_at.saturating_sub(now.timestamp()) <= margin.num_seconds(),
            None => false,
        }
    }

    /// Encode for the session cookie
    pub fn to_cookie_value(&self) -> AuthResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(encode_cookie_value(&json))
    }

    /// Decode a session cookie value
    pub fn from_cookie_value(raw: &str) -> AuthResult<Self> {
        let bytes =
            decode_cookie_value(raw).map_err(|e| AuthError::SessionMalformed(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| AuthError::SessionMalformed(e.to_string()))
    }
}

/// Read the `exp` claim of a JWT without verifying it.
///
/// Only used to schedule refreshes; the provider verifies the token.
pub fn jwt_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

/// Cookie side effect of resolving a session
#[derive(Debug, Clone, PartialEq)]
pub enum CookieMutation {
    /// Write rotated tokens
    Set(SessionTokens),
    /// Remove the session cookie and its chunks
    Clear,
}
