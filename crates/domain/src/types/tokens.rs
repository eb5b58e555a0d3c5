//! Token types
//!
//! `TokenSet` is the persisted credential shape; `TokenResponse` is the wire
//! shape returned by a token endpoint.

use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{DEFAULT_TOKEN_TYPE, TOKEN_DISPLAY_PREFIX};

/// Credentials currently held by the client.
///
/// Serialized as `{access_token, refresh_token, token_type, expires_in}`;
/// absent values are written as `null`. `expires_in` is advisory only.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenSet {
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_in: None,
        }
    }

    #[must_use]
    pub fn with_expires_in(mut self, expires_in: u64) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Leading characters of the access token, safe for logs and status output.
    #[must_use]
    pub fn masked_access_token(&self) -> String {
        mask(&self.access_token)
    }

    #[must_use]
    pub fn masked_refresh_token(&self) -> Option<String> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty()).map(mask)
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &self.masked_access_token())
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Successful token endpoint response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    /// Token set from an authorization code exchange.
    #[must_use]
    pub fn into_token_set(self) -> TokenSet {
        let token_type = self
            .token_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(default_token_type);
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            token_type,
            expires_in: self.expires_in,
        }
    }

    /// Token set from a refresh grant.
    ///
    /// Providers may omit the refresh token on refresh; the previous one is
    /// retained in that case.
    #[must_use]
    pub fn into_refreshed(self, prior_refresh_token: &str) -> TokenSet {
        let mut tokens = self.into_token_set();
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(prior_refresh_token.to_string());
        }
        tokens
    }
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

fn mask(token: &str) -> String {
    let prefix: String = token.chars().take(TOKEN_DISPLAY_PREFIX).collect();
    if prefix.len() < token.len() {
        format!("{prefix}...")
    } else {
        prefix
    }
}

// Some providers send `expires_in` as a string or a float. Anything that is
// not a non-negative number of seconds becomes `None`.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(u64),
        Float(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Seconds>::deserialize(deserializer)? {
        Some(Seconds::Number(n)) => Some(n),
        Some(Seconds::Float(f)) => whole_seconds(f),
        Some(Seconds::Text(s)) => {
            let s = s.trim();
            s.parse().ok().or_else(|| s.parse().ok().and_then(whole_seconds))
        }
        Some(Seconds::Other(_)) | None => None,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_seconds(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}
