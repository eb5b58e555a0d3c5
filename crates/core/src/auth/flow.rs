//! Interactive authorization code flow
//!
//! One call to [`AuthorizationFlow::run`] is one authorization attempt:
//! `NoToken → AwaitingCallback → Exchanging → Authenticated`, or `Failed` on
//! denial, timeout or state mismatch. Attempt-local secrets (PKCE pair, state)
//! never outlive the call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use loopauth_common::auth::{build_authorization_url, AuthorizationAttempt};
use loopauth_domain::constants::DEFAULT_CALLBACK_TIMEOUT_SECS;
use loopauth_domain::{AuthError, CallbackOutcome, ProviderConfig, Result, TokenSet};
use tracing::{debug, info, warn};

use super::ports::{BrowserLauncher, CallbackReceiver, TokenEndpoint};

/// Phase of one authorization attempt, logged at every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    NoToken,
    AwaitingCallback,
    Exchanging,
    Authenticated,
    Failed,
}

impl AttemptPhase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoToken => "no_token",
            Self::AwaitingCallback => "awaiting_callback",
            Self::Exchanging => "exchanging",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives PKCE generation, the browser redirect, the callback and the code
/// exchange for a single provider.
pub struct AuthorizationFlow {
    config: Arc<ProviderConfig>,
    endpoint: Arc<dyn TokenEndpoint>,
    receiver: Arc<dyn CallbackReceiver>,
    browser: Arc<dyn BrowserLauncher>,
    callback_timeout: Duration,
}

impl AuthorizationFlow {
    pub fn new(
        config: Arc<ProviderConfig>,
        endpoint: Arc<dyn TokenEndpoint>,
        receiver: Arc<dyn CallbackReceiver>,
        browser: Arc<dyn BrowserLauncher>,
    ) -> Self {
        Self {
            config,
            endpoint,
            receiver,
            browser,
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
        }
    }

    /// Override how long to wait for the provider redirect (default 300 s).
    #[must_use]
    pub const fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn callback_timeout(&self) -> Duration {
        self.callback_timeout
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Run one interactive authorization attempt.
    ///
    /// The returned token set has not been persisted.
    ///
    /// # Errors
    /// - `AuthError::CallbackTimeout` if no redirect arrives in time
    /// - `AuthError::ProviderDenied` if the provider returned `error`
    /// - `AuthError::CsrfMismatch` if the echoed state is missing or differs
    /// - `AuthError::TokenExchange` / `InvalidTokenResponse` from the exchange
    /// - `AuthError::Callback` if the listener cannot be bound
    pub async fn run(&self) -> Result<TokenSet> {
        let result = self.run_attempt().await;
        match &result {
            Ok(tokens) => {
                info!(
                    phase = %AttemptPhase::Authenticated,
                    access_token = %tokens.masked_access_token(),
                    has_refresh_token = tokens.has_refresh_token(),
                    "Authorization completed"
                );
            }
            Err(err) => {
                warn!(
                    phase = %AttemptPhase::Failed,
                    error_kind = err.label(),
                    error = %err,
                    "Authorization failed"
                );
            }
        }
        result
    }

    async fn run_attempt(&self) -> Result<TokenSet> {
        debug!(phase = %AttemptPhase::NoToken, "Starting authorization attempt");

        let attempt = AuthorizationAttempt::new();
        let url = build_authorization_url(&self.config, attempt.pkce(), attempt.state());

        let pending = self.receiver.bind(self.config.callback_port()).await?;
        info!(
            phase = %AttemptPhase::AwaitingCallback,
            port = pending.port(),
            timeout_secs = self.callback_timeout.as_secs(),
            "Waiting for authorization callback"
        );

        if let Err(err) = self.browser.open(&url) {
            warn!(error = %err, url = %url, "Could not open browser, continue manually");
        }

        match pending.wait(self.callback_timeout).await? {
            CallbackOutcome::TimedOut => {
                Err(AuthError::CallbackTimeout { timeout_secs: self.callback_timeout.as_secs() })
            }
            CallbackOutcome::Denied { error, description } => {
                Err(AuthError::ProviderDenied { error, description })
            }
            CallbackOutcome::Authorized { code, state } => {
                attempt.verify_state(state.as_deref())?;

                info!(
                    phase = %AttemptPhase::Exchanging,
                    endpoint = self.config.token_endpoint(),
                    "Exchanging authorization code"
                );
                let verifier = attempt.into_verifier();
                self.endpoint.exchange_code(&code, &verifier).await
            }
        }
    }
}
