//! Token endpoint client
//!
//! Form-encoded `POST` for the `authorization_code` and `refresh_token`
//! grants. Requests are sent exactly once: an authorization code is single-use
//! and a refresh token may rotate, so neither is safe to replay.

use std::sync::Arc;

use async_trait::async_trait;
use loopauth_core::TokenEndpoint;
use loopauth_domain::constants::{GRANT_AUTHORIZATION_CODE, GRANT_REFRESH_TOKEN};
use loopauth_domain::{AuthError, ProviderConfig, Result, TokenResponse, TokenSet};
use reqwest::header::ACCEPT;
use reqwest::Method;
use tracing::{debug, info, warn};

use crate::errors::InfraError;
use crate::http::HttpClient;

/// [`TokenEndpoint`] backed by the provider's token URL
pub struct TokenEndpointClient {
    config: Arc<ProviderConfig>,
    http: HttpClient,
}

impl TokenEndpointClient {
    /// Client with a single-attempt HTTP transport.
    ///
    /// # Errors
    /// Returns `AuthError::Network` if the HTTP client cannot be built.
    pub fn new(config: Arc<ProviderConfig>) -> Result<Self> {
        let http = HttpClient::builder().max_attempts(1).build()?;
        Ok(Self::with_http_client(config, http))
    }

    #[must_use]
    pub const fn with_http_client(config: Arc<ProviderConfig>, http: HttpClient) -> Self {
        Self { config, http }
    }

    fn client_params<'a>(&'a self, params: &mut Vec<(&'static str, &'a str)>) {
        params.push(("client_id", self.config.client_id()));
        if let Some(secret) = self.config.client_secret() {
            params.push(("client_secret", secret));
        }
    }

    async fn post_form(&self, grant_type: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let endpoint = self.config.token_endpoint();
        debug!(endpoint, grant_type, "Calling token endpoint");

        let builder = self
            .http
            .request(Method::POST, endpoint)
            .header(ACCEPT, "application/json")
            .form(params);
        let response = self.http.send(builder).await?;

        let status = response.status();
        let body = response.text().await.map_err(|err| AuthError::from(InfraError::from(err)))?;

        if !status.is_success() {
            warn!(
                endpoint,
                grant_type,
                status = status.as_u16(),
                "Token endpoint rejected request"
            );
            return Err(AuthError::TokenExchange {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|err| AuthError::InvalidTokenResponse {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            })?;

        if parsed.access_token.is_empty() {
            return Err(AuthError::InvalidTokenResponse {
                endpoint: endpoint.to_string(),
                message: "access_token is empty".to_string(),
            });
        }

        Ok(parsed)
    }
}

#[async_trait]
impl TokenEndpoint for TokenEndpointClient {
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenSet> {
        let mut params = vec![
            ("grant_type", GRANT_AUTHORIZATION_CODE),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri()),
        ];
        self.client_params(&mut params);
        params.push(("code_verifier", code_verifier));

        let tokens = self.post_form(GRANT_AUTHORIZATION_CODE, &params).await?.into_token_set();
        info!(
            access_token = %tokens.masked_access_token(),
            has_refresh_token = tokens.has_refresh_token(),
            expires_in = ?tokens.expires_in,
            "Authorization code exchanged"
        );
        Ok(tokens)
    }

    async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenSet> {
        let refresh_token =
            refresh_token.filter(|t| !t.is_empty()).ok_or(AuthError::NoRefreshToken)?;

        let mut params =
            vec![("grant_type", GRANT_REFRESH_TOKEN), ("refresh_token", refresh_token)];
        self.client_params(&mut params);

        let tokens =
            self.post_form(GRANT_REFRESH_TOKEN, &params).await?.into_refreshed(refresh_token);
        info!(
            access_token = %tokens.masked_access_token(),
            expires_in = ?tokens.expires_in,
            "Access token refreshed"
        );
        Ok(tokens)
    }
}
