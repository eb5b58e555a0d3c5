//! Session management
//!
//! `obtain_session` is the explicit two-way entry point: resume the stored
//! token set when one exists, otherwise run the interactive flow and persist
//! its result.

use std::sync::Arc;

use loopauth_domain::{AuthError, Result, TokenSet};
use tracing::{debug, info};

use super::client::AuthenticatedClient;
use super::flow::AuthorizationFlow;
use super::ports::{HttpTransport, TokenEndpoint, TokenStore};

/// Where a session's tokens came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    /// Loaded from the token store without contacting the provider.
    Resumed,
    /// Minted by a fresh interactive authorization.
    Authorized,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    tokens: TokenSet,
    source: SessionSource,
}

impl Session {
    #[must_use]
    pub const fn new(tokens: TokenSet, source: SessionSource) -> Self {
        Self { tokens, source }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.tokens.token_type
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    #[must_use]
    pub const fn source(&self) -> SessionSource {
        self.source
    }

    #[must_use]
    pub fn into_tokens(self) -> TokenSet {
        self.tokens
    }
}

/// Coordinates the token store, the token endpoint and the interactive flow
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    endpoint: Arc<dyn TokenEndpoint>,
    flow: AuthorizationFlow,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        endpoint: Arc<dyn TokenEndpoint>,
        flow: AuthorizationFlow,
    ) -> Self {
        Self { store, endpoint, flow }
    }

    /// Resume the stored session, or authorize interactively if none exists.
    ///
    /// A stored session is returned as-is; expiry is discovered later through
    /// a 401 on an authenticated request.
    ///
    /// # Errors
    /// Propagates store failures and every error of [`AuthorizationFlow::run`].
    pub async fn obtain_session(&self) -> Result<Session> {
        if let Some(session) = self.resume().await? {
            return Ok(session);
        }
        self.authorize().await
    }

    /// Load the stored session, if any.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` if the store exists but cannot be read.
    pub async fn resume(&self) -> Result<Option<Session>> {
        let tokens = self.store.load().await?;
        match tokens {
            Some(tokens) => {
                info!(access_token = %tokens.masked_access_token(), "Resuming stored session");
                Ok(Some(Session::new(tokens, SessionSource::Resumed)))
            }
            None => {
                debug!("No stored session");
                Ok(None)
            }
        }
    }

    /// Run the interactive flow unconditionally and persist the result.
    ///
    /// # Errors
    /// See [`AuthorizationFlow::run`]; also fails if the tokens cannot be saved.
    pub async fn authorize(&self) -> Result<Session> {
        let tokens = self.flow.run().await?;
        self.store.save(&tokens).await?;
        info!("Tokens stored");
        Ok(Session::new(tokens, SessionSource::Authorized))
    }

    /// Refresh the stored tokens now and persist the result.
    ///
    /// # Errors
    /// `AuthError::NoRefreshToken` when nothing (or no refresh token) is
    /// stored; token endpoint errors propagate unchanged and leave the stored
    /// tokens untouched.
    pub async fn refresh_now(&self) -> Result<TokenSet> {
        let current = self.store.load().await?.ok_or(AuthError::NoRefreshToken)?;
        let renewed = self.endpoint.refresh(current.refresh_token.as_deref()).await?;
        self.store.save(&renewed).await?;
        info!(access_token = %renewed.masked_access_token(), "Tokens refreshed");
        Ok(renewed)
    }

    /// Stored tokens, without starting any flow.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` if the store cannot be read.
    pub async fn current(&self) -> Result<Option<TokenSet>> {
        self.store.load().await
    }

    /// Forget the stored session.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` if the store cannot be cleared.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await?;
        info!("Stored session cleared");
        Ok(())
    }

    /// Request wrapper bound to `session`, sharing this manager's store and
    /// token endpoint.
    pub fn client(
        &self,
        session: Session,
        transport: Arc<dyn HttpTransport>,
    ) -> AuthenticatedClient {
        AuthenticatedClient::new(
            session.into_tokens(),
            transport,
            Arc::clone(&self.endpoint),
            Arc::clone(&self.store),
        )
    }

    #[must_use]
    pub const fn flow(&self) -> &AuthorizationFlow {
        &self.flow
    }
}
