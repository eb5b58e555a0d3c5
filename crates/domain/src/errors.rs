//! Error types used throughout the authorization flow

use thiserror::Error;

/// Main error type for loopauth
///
/// Each failure kind of the authorization code flow has its own variant so
/// callers (and the CLI exit code) can tell them apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing required configuration field: {0}")]
    MissingConfigField(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(
        "state parameter mismatch (possible CSRF attack), received {}",
        .received.as_deref().unwrap_or("<none>")
    )]
    CsrfMismatch { received: Option<String> },

    #[error("no authorization callback received within {timeout_secs} seconds")]
    CallbackTimeout { timeout_secs: u64 },

    #[error(
        "authorization denied by provider: {error}{}",
        .description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
    )]
    ProviderDenied { error: String, description: Option<String> },

    #[error("token endpoint {endpoint} returned HTTP {status}: {body}")]
    TokenExchange { endpoint: String, status: u16, body: String },

    #[error("invalid token response from {endpoint}: {message}")]
    InvalidTokenResponse { endpoint: String, message: String },

    #[error("no refresh token available, full reauthorization required")]
    NoRefreshToken,

    #[error("callback listener error: {0}")]
    Callback(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("token storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable label suitable for structured logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MissingConfigField(_) | Self::Config(_) => "config",
            Self::CsrfMismatch { .. } => "csrf_mismatch",
            Self::CallbackTimeout { .. } => "callback_timeout",
            Self::ProviderDenied { .. } => "provider_denied",
            Self::TokenExchange { .. } => "token_exchange",
            Self::InvalidTokenResponse { .. } => "invalid_token_response",
            Self::NoRefreshToken => "no_refresh_token",
            Self::Callback(_) => "callback",
            Self::Network(_) => "network",
            Self::Storage(_) => "storage",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the caller has to fall back to the interactive flow.
    ///
    /// True when no refresh token is held, or when the token endpoint rejected
    /// the grant outright (`invalid_grant` is reported as 400, some providers
    /// use 401).
    #[must_use]
    pub const fn is_reauthorization_required(&self) -> bool {
        matches!(
            self,
            Self::NoRefreshToken | Self::TokenExchange { status: 400 | 401, .. }
        )
    }

    /// Whether the error was caused by configuration rather than runtime state.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::MissingConfigField(_) | Self::Config(_))
    }
}

/// Result type alias for loopauth operations
pub type Result<T> = std::result::Result<T, AuthError>;
