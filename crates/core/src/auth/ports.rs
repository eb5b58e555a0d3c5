//! Port interfaces for the authorization flow
//!
//! These traits define the boundaries between core authorization logic
//! and infrastructure implementations (filesystem, HTTP, loopback listener,
//! system browser).

use std::time::Duration;

use async_trait::async_trait;
use loopauth_domain::{ApiRequest, ApiResponse, CallbackOutcome, Result, TokenSet};

/// Persistence for the current token set
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the previously saved token set.
    ///
    /// `Ok(None)` means "no prior session" and is not an error.
    async fn load(&self) -> Result<Option<TokenSet>>;

    /// Persist `tokens`, replacing whatever was stored before.
    async fn save(&self, tokens: &TokenSet) -> Result<()>;

    /// Remove the stored token set. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<()>;
}

/// The provider's token endpoint
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchange an authorization code and its PKCE verifier for tokens.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenSet>;

    /// Mint a new token set from a refresh token.
    ///
    /// Fails with `AuthError::NoRefreshToken` when `refresh_token` is absent or
    /// empty; the prior refresh token is kept when the response omits one.
    async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenSet>;
}

/// Binds the loopback listener that receives the provider redirect
#[async_trait]
pub trait CallbackReceiver: Send + Sync {
    /// Start listening on `port`. The listener is reachable once this returns.
    async fn bind(&self, port: u16) -> Result<Box<dyn PendingCallback>>;
}

/// A bound, one-shot callback listener
#[async_trait]
pub trait PendingCallback: Send {
    /// Port actually bound.
    fn port(&self) -> u16;

    /// Wait for the first qualifying request, or until `timeout` elapses.
    ///
    /// The listener is shut down before this returns, whatever the outcome.
    async fn wait(self: Box<Self>, timeout: Duration) -> Result<CallbackOutcome>;
}

/// Opens the authorization URL for the user
pub trait BrowserLauncher: Send + Sync {
    /// Open `url`. Failure is not fatal to the flow.
    fn open(&self, url: &str) -> Result<()>;
}

/// Sends already-authorized API requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue `request` and return the response whatever its status.
    ///
    /// Errors are reserved for transport failures (connect, timeout, TLS).
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}
