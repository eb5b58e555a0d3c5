//! Authorization callback outcome

use std::collections::HashMap;

/// A qualifying redirect received by the loopback listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackRedirect {
    /// The provider issued an authorization code.
    Authorized { code: String, state: Option<String> },
    /// The provider (or the user) refused authorization.
    Denied { error: String, description: Option<String> },
}

impl CallbackRedirect {
    /// Classify a callback query string.
    ///
    /// Returns `None` for requests that carry neither a non-empty `code` nor a
    /// non-empty `error`; those do not complete the listener. `code` wins when
    /// both are present.
    #[must_use]
    pub fn from_query(params: &HashMap<String, String>) -> Option<Self> {
        let value = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();

        if let Some(code) = value("code") {
            return Some(Self::Authorized { code, state: value("state") });
        }
        value("error").map(|error| Self::Denied { error, description: value("error_description") })
    }
}

/// Result of waiting for the provider to redirect back to the loopback
/// listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The provider issued an authorization code.
    Authorized { code: String, state: Option<String> },
    /// The provider (or the user) refused authorization.
    Denied { error: String, description: Option<String> },
    /// No qualifying request arrived before the deadline.
    TimedOut,
}

impl CallbackOutcome {
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }
}

impl From<CallbackRedirect> for CallbackOutcome {
    fn from(redirect: CallbackRedirect) -> Self {
        match redirect {
            CallbackRedirect::Authorized { code, state } => Self::Authorized { code, state },
            CallbackRedirect::Denied { error, description } => Self::Denied { error, description },
        }
    }
}
