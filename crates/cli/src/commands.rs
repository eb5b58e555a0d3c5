//! Subcommand handlers

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use loopauth_core::{AuthorizationFlow, SessionManager, SessionSource, TokenStore};
use loopauth_domain::{HttpMethod, RequestOptions, TokenSet};
use loopauth_infra::{config, CallbackServer, FileTokenStore, HttpClient, TokenEndpointClient};

use crate::browser::PrintingBrowser;
use crate::GlobalArgs;

fn token_store(args: &GlobalArgs) -> Arc<FileTokenStore> {
    Arc::new(FileTokenStore::new(&args.tokens))
}

fn session_manager(args: &GlobalArgs) -> Result<SessionManager> {
    let config = Arc::new(config::load(args.config.clone())?);
    let endpoint = Arc::new(TokenEndpointClient::new(Arc::clone(&config))?);

    let flow = AuthorizationFlow::new(
        config,
        endpoint.clone(),
        Arc::new(CallbackServer::new()),
        Arc::new(PrintingBrowser::new(!args.no_browser)),
    )
    .with_callback_timeout(Duration::from_secs(args.timeout));

    Ok(SessionManager::new(token_store(args), endpoint, flow))
}

pub async fn login(args: &GlobalArgs, force: bool) -> Result<()> {
    let manager = session_manager(args)?;
    let session =
        if force { manager.authorize().await? } else { manager.obtain_session().await? };

    match session.source() {
        SessionSource::Resumed => {
            println!("Already logged in (tokens from {})", args.tokens.display());
        }
        SessionSource::Authorized => {
            println!("Logged in, tokens saved to {}", args.tokens.display());
        }
    }
    println!("access token: {}", session.tokens().masked_access_token());
    Ok(())
}

pub async fn refresh(args: &GlobalArgs) -> Result<()> {
    let manager = session_manager(args)?;
    let tokens = manager.refresh_now().await?;

    println!("Tokens refreshed and saved to {}", args.tokens.display());
    println!("access token: {}", tokens.masked_access_token());
    Ok(())
}

pub async fn status(args: &GlobalArgs) -> Result<()> {
    let store = token_store(args);
    let Some(tokens) = store.load().await? else {
        println!("No stored session ({} does not exist)", store.path().display());
        return Ok(());
    };
    let saved_at = store.modified_at().await?;

    for line in describe(&tokens, saved_at, Utc::now()) {
        println!("{line}");
    }
    Ok(())
}

pub async fn request(
    args: &GlobalArgs,
    method: HttpMethod,
    url: &str,
    headers: Vec<(String, String)>,
    data: Option<String>,
) -> Result<()> {
    let manager = session_manager(args)?;
    let session = manager.obtain_session().await?;
    let client = manager.client(session, Arc::new(HttpClient::new()?));

    let mut options = RequestOptions::default();
    for (name, value) in headers {
        options = options.header(name, value);
    }
    if let Some(data) = data {
        options = options.body(data);
    }

    let response = client.request(method, url, options).await?;

    eprintln!("HTTP {}", response.status);
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&response.body).context("failed to write response body")?;
    stdout.flush().context("failed to write response body")?;
    Ok(())
}

pub async fn logout(args: &GlobalArgs) -> Result<()> {
    let store = token_store(args);
    store.clear().await?;
    println!("Logged out ({} removed)", store.path().display());
    Ok(())
}

/// Parse a `name: value` header argument.
pub fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) =
        raw.split_once(':').ok_or_else(|| format!("expected `name: value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn describe(tokens: &TokenSet, saved_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Vec<String> {
    vec![
        format!("access token:  {}", tokens.masked_access_token()),
        format!(
            "refresh token: {}",
            tokens.masked_refresh_token().unwrap_or_else(|| "none".to_string())
        ),
        format!("token type:    {}", tokens.token_type),
        format!("expiry:        {}", expiry_summary(tokens.expires_in, saved_at, now)),
    ]
}

/// Advisory only; the server's 401 remains the source of truth.
fn expiry_summary(
    expires_in: Option<u64>,
    saved_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String {
    let (Some(expires_in), Some(saved_at)) = (expires_in, saved_at) else {
        return "unknown".to_string();
    };
    let Some(expires_at) = i64::try_from(expires_in)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|lifetime| saved_at.checked_add_signed(lifetime))
    else {
        return "unknown".to_string();
    };

    let remaining = expires_at - now;
    if remaining <= chrono::Duration::zero() {
        format!("probably expired (at {})", expires_at.to_rfc3339())
    } else {
        let minutes = remaining.num_minutes();
        format!("~{}h {}m remaining (at {})", minutes / 60, minutes % 60, expires_at.to_rfc3339())
    }
}
