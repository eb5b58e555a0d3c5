//! Mock port implementations for testing
//!
//! Every mock records how it was used so tests can assert on call counts and
//! arguments.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use loopauth_core::{
    BrowserLauncher, CallbackReceiver, HttpTransport, PendingCallback, TokenEndpoint, TokenStore,
};
use loopauth_domain::{
    ApiRequest, ApiResponse, AuthError, CallbackOutcome, Result as DomainResult, TokenSet,
};
use tokio::sync::oneshot;

/// In-memory `TokenStore` counting saves. Saves can be made to fail.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenSet>>,
    saves: AtomicUsize,
    loads: AtomicUsize,
    fail_saves: bool,
}

impl MemoryTokenStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenSet) -> Self {
        Self { tokens: Mutex::new(Some(tokens)), ..Self::default() }
    }

    /// Every save is counted, then rejected with a storage error.
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    pub fn stored(&self) -> Option<TokenSet> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> DomainResult<Option<TokenSet>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn save(&self, tokens: &TokenSet) -> DomainResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(AuthError::Storage("disk full".to_string()));
        }
        *self.tokens.lock().unwrap() = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> DomainResult<()> {
        *self.tokens.lock().unwrap() = None;
        Ok(())
    }
}

/// `TokenEndpoint` returning scripted results.
pub struct ScriptedTokenEndpoint {
    exchange_result: DomainResult<TokenSet>,
    refresh_results: Mutex<VecDeque<DomainResult<TokenSet>>>,
    refresh_delay: Duration,
    exchanges: Mutex<Vec<(String, String)>>,
    refreshes: Mutex<Vec<String>>,
}

impl ScriptedTokenEndpoint {
    pub fn exchanging_to(tokens: TokenSet) -> Self {
        Self::with_exchange_result(Ok(tokens))
    }

    pub fn with_exchange_result(result: DomainResult<TokenSet>) -> Self {
        Self {
            exchange_result: result,
            refresh_results: Mutex::new(VecDeque::new()),
            refresh_delay: Duration::ZERO,
            exchanges: Mutex::new(Vec::new()),
            refreshes: Mutex::new(Vec::new()),
        }
    }

    /// Endpoint whose exchange is never expected to be called.
    pub fn refresh_only() -> Self {
        Self::with_exchange_result(Err(AuthError::Internal("unexpected code exchange".into())))
    }

    pub fn then_refresh(self, result: DomainResult<TokenSet>) -> Self {
        self.refresh_results.lock().unwrap().push_back(result);
        self
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// `(code, code_verifier)` pairs seen by `exchange_code`.
    pub fn exchanges(&self) -> Vec<(String, String)> {
        self.exchanges.lock().unwrap().clone()
    }

    /// Refresh tokens seen by `refresh`.
    pub fn refreshes(&self) -> Vec<String> {
        self.refreshes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenEndpoint for ScriptedTokenEndpoint {
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> DomainResult<TokenSet> {
        self.exchanges.lock().unwrap().push((code.to_string(), code_verifier.to_string()));
        self.exchange_result.clone()
    }

    async fn refresh(&self, refresh_token: Option<&str>) -> DomainResult<TokenSet> {
        let refresh_token =
            refresh_token.filter(|t| !t.is_empty()).ok_or(AuthError::NoRefreshToken)?;
        self.refreshes.lock().unwrap().push(refresh_token.to_string());
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        self.refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AuthError::Internal("no scripted refresh result".into())))
    }
}

/// How the simulated provider answers once the browser is opened.
#[derive(Debug, Clone)]
pub enum ProviderBehavior {
    /// Redirect with `code` and the state taken from the authorization URL.
    Approve { code: String },
    /// Redirect with `code` and a different state.
    ForgeState { code: String, state: String },
    /// Redirect with `code` only.
    OmitState { code: String },
    /// Redirect with `error` / `error_description`.
    Deny { error: String, description: Option<String> },
    /// Never redirect.
    Ignore,
}

/// Combined browser + callback receiver standing in for the user and the
/// provider: opening the authorization URL immediately "redirects" back.
pub struct SimulatedProvider {
    behavior: ProviderBehavior,
    browser_fails: bool,
    sender: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
    opened: Mutex<Vec<String>>,
    bound_ports: Mutex<Vec<u16>>,
}

impl SimulatedProvider {
    pub fn new(behavior: ProviderBehavior) -> Self {
        Self {
            behavior,
            browser_fails: false,
            sender: Mutex::new(None),
            opened: Mutex::new(Vec::new()),
            bound_ports: Mutex::new(Vec::new()),
        }
    }

    pub fn approving(code: &str) -> Self {
        Self::new(ProviderBehavior::Approve { code: code.to_string() })
    }

    /// Browser launch fails, but the user still completes the redirect.
    pub fn with_failing_browser(mut self) -> Self {
        self.browser_fails = true;
        self
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn bound_ports(&self) -> Vec<u16> {
        self.bound_ports.lock().unwrap().clone()
    }

    fn outcome_for(&self, url: &str) -> Option<CallbackOutcome> {
        let state = url::Url::parse(url)
            .ok()
            .and_then(|u| u.query_pairs().find(|(k, _)| k == "state").map(|(_, v)| v.into_owned()));
        match &self.behavior {
            ProviderBehavior::Approve { code } => {
                Some(CallbackOutcome::Authorized { code: code.clone(), state })
            }
            ProviderBehavior::ForgeState { code, state } => {
                Some(CallbackOutcome::Authorized { code: code.clone(), state: Some(state.clone()) })
            }
            ProviderBehavior::OmitState { code } => {
                Some(CallbackOutcome::Authorized { code: code.clone(), state: None })
            }
            ProviderBehavior::Deny { error, description } => {
                Some(CallbackOutcome::Denied {
                    error: error.clone(),
                    description: description.clone(),
                })
            }
            ProviderBehavior::Ignore => None,
        }
    }
}

impl BrowserLauncher for SimulatedProvider {
    fn open(&self, url: &str) -> DomainResult<()> {
        self.opened.lock().unwrap().push(url.to_string());
        if let Some(outcome) = self.outcome_for(url) {
            if let Some(sender) = self.sender.lock().unwrap().take() {
                let _ = sender.send(outcome);
            }
        }
        if self.browser_fails {
            return Err(AuthError::Internal("no browser available".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CallbackReceiver for SimulatedProvider {
    async fn bind(&self, port: u16) -> DomainResult<Box<dyn PendingCallback>> {
        self.bound_ports.lock().unwrap().push(port);
        let (tx, rx) = oneshot::channel();
        *self.sender.lock().unwrap() = Some(tx);
        Ok(Box::new(SimulatedPending { port, receiver: rx }))
    }
}

struct SimulatedPending {
    port: u16,
    receiver: oneshot::Receiver<CallbackOutcome>,
}

#[async_trait]
impl PendingCallback for SimulatedPending {
    fn port(&self) -> u16 {
        self.port
    }

    async fn wait(self: Box<Self>, timeout: Duration) -> DomainResult<CallbackOutcome> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(outcome)) => Ok(outcome),
            // Sender still parked in the provider (Ignore) or dropped.
            Ok(Err(_)) | Err(_) => Ok(CallbackOutcome::TimedOut),
        }
    }
}

/// `HttpTransport` answering by `Authorization` header value.
pub struct ScriptedTransport {
    statuses: HashMap<String, u16>,
    default_status: u16,
    delay: Duration,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            statuses: HashMap::new(),
            default_status: 200,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Respond with `status` when the request carries `authorization`.
    pub fn respond(mut self, authorization: &str, status: u16) -> Self {
        self.statuses.insert(authorization.to_string(), status);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `Authorization` header of each request, in order.
    pub fn authorizations(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.header("Authorization").unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> DomainResult<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let status = request
            .header("Authorization")
            .and_then(|auth| self.statuses.get(auth).copied())
            .unwrap_or(self.default_status);
        Ok(ApiResponse::new(status, format!("status {status}")))
    }
}
