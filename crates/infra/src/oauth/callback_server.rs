//! Loopback listener for the provider redirect
//!
//! Binds `127.0.0.1:<port>`, accepts the redirect on any path and hands the
//! first qualifying request (`code` or `error`) to the waiting flow over a
//! one-shot channel. The server is shut down as soon as the wait ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use loopauth_core::{CallbackReceiver, PendingCallback};
use loopauth_domain::constants::CALLBACK_BIND_HOST;
use loopauth_domain::{AuthError, CallbackOutcome, CallbackRedirect, Result};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization Complete</title></head>
<body><h1>Authorization Successful</h1>
<p>You can close this window and return to the application.</p></body>
</html>"#;

const NOT_FOUND_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Not Found</title></head>
<body><h1>Not Found</h1><p>Waiting for the authorization redirect.</p></body>
</html>"#;

const ALREADY_COMPLETED_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Authorization Already Completed</title></head>
<body><h1>Authorization Already Completed</h1><p>This callback has already been handled.</p></body>
</html>"#;

/// [`CallbackReceiver`] serving the loopback redirect with axum
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackServer;

impl CallbackServer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CallbackReceiver for CallbackServer {
    async fn bind(&self, port: u16) -> Result<Box<dyn PendingCallback>> {
        Ok(Box::new(CallbackListener::start(port).await?))
    }
}

struct CallbackState {
    sender: StdMutex<Option<oneshot::Sender<CallbackRedirect>>>,
}

impl CallbackState {
    fn take_sender(&self) -> Option<oneshot::Sender<CallbackRedirect>> {
        match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

/// A running one-shot listener
pub struct CallbackListener {
    port: u16,
    redirect_rx: oneshot::Receiver<CallbackRedirect>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Bind `127.0.0.1:<port>` and start serving. Port 0 picks a free port.
    ///
    /// # Errors
    /// Returns `AuthError::Callback` if the port cannot be bound.
    pub async fn start(port: u16) -> Result<Self> {
        let listener = TcpListener::bind((CALLBACK_BIND_HOST, port)).await.map_err(|err| {
            AuthError::Callback(format!("failed to bind {CALLBACK_BIND_HOST}:{port}: {err}"))
        })?;

        let port = listener
            .local_addr()
            .map_err(|err| AuthError::Callback(format!("failed to determine port: {err}")))?
            .port();

        let (redirect_tx, redirect_rx) = oneshot::channel();
        let state = Arc::new(CallbackState { sender: StdMutex::new(Some(redirect_tx)) });
        let app = Router::new().fallback(handle_callback).with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
            {
                error!("Callback server error: {}", err);
            }
        });

        debug!(port, "Callback listener bound");
        Ok(Self { port, redirect_rx, shutdown_tx: Some(shutdown_tx), handle: Some(handle) })
    }

    async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut handle) = self.handle.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
                warn!(port = self.port, "Callback server did not stop in time, aborting");
                handle.abort();
                let _ = handle.await;
            }
        }
        debug!(port = self.port, "Callback listener stopped");
    }
}

#[async_trait]
impl PendingCallback for CallbackListener {
    fn port(&self) -> u16 {
        self.port
    }

    async fn wait(mut self: Box<Self>, timeout: Duration) -> Result<CallbackOutcome> {
        let result = tokio::time::timeout(timeout, &mut self.redirect_rx).await;
        self.shutdown().await;

        match result {
            Ok(Ok(redirect)) => Ok(redirect.into()),
            Ok(Err(_)) => Err(AuthError::Callback("callback server stopped unexpectedly".into())),
            Err(_) => {
                info!(
                    port = self.port,
                    timeout_secs = timeout.as_secs(),
                    "No callback received before timeout"
                );
                Ok(CallbackOutcome::TimedOut)
            }
        }
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                handle.abort();
            }
        }
    }
}

async fn handle_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(redirect) = CallbackRedirect::from_query(&params) else {
        return page(StatusCode::NOT_FOUND, NOT_FOUND_PAGE.to_string());
    };

    let Some(sender) = state.take_sender() else {
        debug!("Ignoring callback after the first one was handled");
        return page(StatusCode::GONE, ALREADY_COMPLETED_PAGE.to_string());
    };

    let response = match &redirect {
        CallbackRedirect::Authorized { .. } => {
            info!("Authorization code received");
            page(StatusCode::OK, SUCCESS_PAGE.to_string())
        }
        CallbackRedirect::Denied { error, description } => {
            warn!(error = %error, description = ?description, "Provider returned an error");
            page(StatusCode::BAD_REQUEST, failure_page(error, description.as_deref()))
        }
    };

    if sender.send(redirect).is_err() {
        debug!("Callback arrived after the flow stopped waiting");
    }
    response
}

fn page(status: StatusCode, body: String) -> Response {
    (status, [(header::CONNECTION, "close")], Html(body)).into_response()
}

fn failure_page(error: &str, description: Option<&str>) -> String {
    let description = description.map(escape_html).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Authorization Failed</title></head>
<body><h1>Authorization Failed</h1><p>Error: {}</p><p>{}</p></body>
</html>"#,
        escape_html(error),
        description
    )
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
