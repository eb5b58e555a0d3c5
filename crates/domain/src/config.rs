//! Provider configuration
//!
//! `RawProviderConfig` mirrors the on-disk/environment mapping; every field is
//! optional so that a missing key can be reported by name. `ProviderConfig` is
//! the validated, immutable form owned by the client for its whole lifetime.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::DEFAULT_CALLBACK_PORT;
use crate::errors::{AuthError, Result};

/// A `scope` value as written in configuration: either a space separated
/// string or a list of individual scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeValue {
    Joined(String),
    List(Vec<String>),
}

impl ScopeValue {
    /// Split into individual, non-empty scope values.
    #[must_use]
    pub fn into_scopes(self) -> Vec<String> {
        match self {
            Self::Joined(joined) => joined.split_whitespace().map(str::to_string).collect(),
            Self::List(list) => list
                .into_iter()
                .map(|scope| scope.trim().to_string())
                .filter(|scope| !scope.is_empty())
                .collect(),
        }
    }
}

/// Unvalidated provider configuration, as read from a file or the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProviderConfig {
    #[serde(default)]
    pub authorization_endpoint: Option<String>,
    #[serde(default)]
    pub token_endpoint: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub scope: Option<ScopeValue>,
    #[serde(default)]
    pub refresh_token_scope: Option<String>,
}

/// Validated OAuth 2.0 provider configuration.
///
/// Invariants: authorization endpoint, token endpoint, client identifier and
/// redirect URI are non-empty (and the URLs parse); at least one scope value is
/// present, either in `scopes` or as the refresh-token scope.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    authorization_endpoint: String,
    token_endpoint: String,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    scopes: Vec<String>,
    refresh_token_scope: Option<String>,
    callback_port: u16,
}

impl ProviderConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    /// Returns `AuthError::MissingConfigField` naming the first empty required
    /// field, or `AuthError::Config` if a URL does not parse.
    pub fn new(
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Result<Self> {
        Self::from_raw(RawProviderConfig {
            authorization_endpoint: Some(authorization_endpoint.into()),
            token_endpoint: Some(token_endpoint.into()),
            client_id: Some(client_id.into()),
            client_secret: None,
            redirect_uri: Some(redirect_uri.into()),
            scope: Some(ScopeValue::List(scopes)),
            refresh_token_scope: None,
        })
    }

    /// Validate a raw mapping, failing fast on the first missing key.
    ///
    /// # Errors
    /// See [`ProviderConfig::new`].
    pub fn from_raw(raw: RawProviderConfig) -> Result<Self> {
        let authorization_endpoint =
            required("authorization_endpoint", raw.authorization_endpoint)?;
        let token_endpoint = required("token_endpoint", raw.token_endpoint)?;
        let client_id = required("client_id", raw.client_id)?;
        let redirect_uri = required("redirect_uri", raw.redirect_uri)?;

        let scopes = raw.scope.map(ScopeValue::into_scopes).unwrap_or_default();
        let refresh_token_scope = non_empty(raw.refresh_token_scope);
        if scopes.is_empty() && refresh_token_scope.is_none() {
            return Err(AuthError::MissingConfigField(
                "scope or refresh_token_scope".to_string(),
            ));
        }

        parse_url("authorization_endpoint", &authorization_endpoint)?;
        parse_url("token_endpoint", &token_endpoint)?;
        let redirect = parse_url("redirect_uri", &redirect_uri)?;
        let callback_port = callback_port_of(&redirect_uri, &redirect);

        Ok(Self {
            authorization_endpoint,
            token_endpoint,
            client_id,
            client_secret: non_empty(raw.client_secret),
            redirect_uri,
            scopes,
            refresh_token_scope,
            callback_port,
        })
    }

    /// Attach a client secret (some providers require one even with PKCE).
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = non_empty(Some(secret.into()));
        self
    }

    /// Request a distinct scope that takes precedence over `scopes`.
    #[must_use]
    pub fn with_refresh_token_scope(mut self, scope: impl Into<String>) -> Self {
        self.refresh_token_scope = non_empty(Some(scope.into()));
        self
    }

    #[must_use]
    pub fn authorization_endpoint(&self) -> &str {
        &self.authorization_endpoint
    }

    #[must_use]
    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn refresh_token_scope(&self) -> Option<&str> {
        self.refresh_token_scope.as_deref()
    }

    /// Scope sent in the authorization request.
    ///
    /// The refresh-token scope wins when configured; otherwise the default
    /// scopes are joined with spaces.
    #[must_use]
    pub fn authorization_scope(&self) -> String {
        match &self.refresh_token_scope {
            Some(scope) => scope.clone(),
            None => self.scopes.join(" "),
        }
    }

    /// Port the callback listener binds, taken from the redirect URI.
    ///
    /// A port written in the URI is used even when it equals the scheme
    /// default; 4200 applies only when no port is written.
    #[must_use]
    pub const fn callback_port(&self) -> u16 {
        self.callback_port
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("refresh_token_scope", &self.refresh_token_scope)
            .finish()
    }
}

impl TryFrom<RawProviderConfig> for ProviderConfig {
    type Error = AuthError;

    fn try_from(raw: RawProviderConfig) -> Result<Self> {
        Self::from_raw(raw)
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    non_empty(value).ok_or_else(|| AuthError::MissingConfigField(field.to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| AuthError::Config(format!("{field} is not a valid URL: {e}")))
}

// `Url::port` drops a port equal to the scheme default, so the written
// authority decides whether a port was given at all.
fn callback_port_of(written: &str, redirect: &Url) -> u16 {
    if has_explicit_port(written) {
        redirect.port_or_known_default().unwrap_or(DEFAULT_CALLBACK_PORT)
    } else {
        DEFAULT_CALLBACK_PORT
    }
}

fn has_explicit_port(url: &str) -> bool {
    let Some((_, rest)) = url.split_once("://") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let port = match host_port.rsplit_once(']') {
        Some((_, after_ipv6)) => after_ipv6.strip_prefix(':'),
        None => host_port.rsplit_once(':').map(|(_, port)| port),
    };
    port.is_some_and(|port| !port.is_empty())
}
