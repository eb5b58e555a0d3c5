//! Authenticated request wrapper
//!
//! Attaches `Authorization: <token_type> <access_token>` to every request. A
//! 401 triggers exactly one refresh-and-retry; the refreshed tokens are saved
//! before the retry is sent. Concurrent 401s for the same access token share a
//! single refresh.

use std::sync::Arc;

use loopauth_domain::{ApiRequest, ApiResponse, HttpMethod, RequestOptions, Result, TokenSet};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::ports::{HttpTransport, TokenEndpoint, TokenStore};

/// Issues API requests with the current access token
pub struct AuthenticatedClient {
    tokens: RwLock<TokenSet>,
    refresh_lock: Mutex<()>,
    transport: Arc<dyn HttpTransport>,
    endpoint: Arc<dyn TokenEndpoint>,
    store: Arc<dyn TokenStore>,
}

impl AuthenticatedClient {
    pub fn new(
        tokens: TokenSet,
        transport: Arc<dyn HttpTransport>,
        endpoint: Arc<dyn TokenEndpoint>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            tokens: RwLock::new(tokens),
            refresh_lock: Mutex::new(()),
            transport,
            endpoint,
            store,
        }
    }

    /// Snapshot of the tokens currently in use.
    pub async fn tokens(&self) -> TokenSet {
        self.tokens.read().await.clone()
    }

    /// Build and send a request.
    ///
    /// # Errors
    /// See [`AuthenticatedClient::send`].
    pub async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.send(&ApiRequest::new(method, url, options)).await
    }

    /// Send `request` with the current token.
    ///
    /// Non-401 responses are returned unchanged. On 401 the tokens are
    /// refreshed, persisted, and the request is retried once; the retry's
    /// response is returned whatever its status.
    ///
    /// # Errors
    /// Transport failures, and any refresh failure (`NoRefreshToken`,
    /// `TokenExchange`, ...) which propagates without retrying the request.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let sent_with = self.tokens().await;
        let authorized = request.with_authorization(&sent_with.authorization_header());
        let response = self.transport.send(&authorized).await?;

        if !response.is_unauthorized() {
            return Ok(response);
        }

        warn!(
            method = %request.method,
            url = %request.url,
            "Request unauthorized, refreshing access token"
        );
        let renewed = self.renew_after_unauthorized(&sent_with).await?;

        debug!(method = %request.method, url = %request.url, "Retrying request once");
        self.transport.send(&request.with_authorization(&renewed.authorization_header())).await
    }

    /// Refresh now, regardless of the last response.
    ///
    /// # Errors
    /// `NoRefreshToken` or token endpoint / store failures.
    pub async fn refresh(&self) -> Result<TokenSet> {
        let _guard = self.refresh_lock.lock().await;
        let current = self.tokens().await;
        self.refresh_locked(&current).await
    }

    async fn renew_after_unauthorized(&self, stale: &TokenSet) -> Result<TokenSet> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.tokens().await;
        if current.access_token != stale.access_token {
            debug!("Access token already renewed by a concurrent request");
            return Ok(current);
        }

        self.refresh_locked(&current).await
    }

    // Caller holds `refresh_lock`.
    async fn refresh_locked(&self, current: &TokenSet) -> Result<TokenSet> {
        let renewed = self.endpoint.refresh(current.refresh_token.as_deref()).await?;

        let saved = self.store.save(&renewed).await;
        // The provider may have rotated the refresh token; keep the new set even
        // if persisting failed.
        *self.tokens.write().await = renewed.clone();
        saved?;

        info!(access_token = %renewed.masked_access_token(), "Access token refreshed");
        Ok(renewed)
    }
}
