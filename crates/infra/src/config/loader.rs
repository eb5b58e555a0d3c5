//! Configuration loader
//!
//! ## Loading Strategy
//! 1. An explicit path always wins
//! 2. Otherwise, if any `LOOPAUTH_*` variable is set, the environment is used
//! 3. Otherwise the working directory is probed for a config file
//!
//! ## Environment Variables
//! - `LOOPAUTH_AUTHORIZATION_ENDPOINT`
//! - `LOOPAUTH_TOKEN_ENDPOINT`
//! - `LOOPAUTH_CLIENT_ID`
//! - `LOOPAUTH_CLIENT_SECRET` (optional)
//! - `LOOPAUTH_REDIRECT_URI`
//! - `LOOPAUTH_SCOPE`: space separated
//! - `LOOPAUTH_REFRESH_TOKEN_SCOPE`
//!
//! ## File Locations
//! `./.config.json`, `./config.json`, `./loopauth.json`, `./loopauth.toml`,
//! then the same names next to the executable.

use std::path::{Path, PathBuf};

use loopauth_domain::{AuthError, ProviderConfig, RawProviderConfig, Result, ScopeValue};

pub const ENV_AUTHORIZATION_ENDPOINT: &str = "LOOPAUTH_AUTHORIZATION_ENDPOINT";
pub const ENV_TOKEN_ENDPOINT: &str = "LOOPAUTH_TOKEN_ENDPOINT";
pub const ENV_CLIENT_ID: &str = "LOOPAUTH_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "LOOPAUTH_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "LOOPAUTH_REDIRECT_URI";
pub const ENV_SCOPE: &str = "LOOPAUTH_SCOPE";
pub const ENV_REFRESH_TOKEN_SCOPE: &str = "LOOPAUTH_REFRESH_TOKEN_SCOPE";

const ENV_KEYS: [&str; 7] = [
    ENV_AUTHORIZATION_ENDPOINT,
    ENV_TOKEN_ENDPOINT,
    ENV_CLIENT_ID,
    ENV_CLIENT_SECRET,
    ENV_REDIRECT_URI,
    ENV_SCOPE,
    ENV_REFRESH_TOKEN_SCOPE,
];

const CONFIG_FILE_NAMES: [&str; 4] =
    [".config.json", "config.json", "loopauth.json", "loopauth.toml"];

/// Load the provider configuration.
///
/// # Errors
/// Returns `AuthError::Config` when no source is found or a file cannot be
/// parsed, and `AuthError::MissingConfigField` for absent required keys.
pub fn load(path: Option<PathBuf>) -> Result<ProviderConfig> {
    if path.is_some() {
        return load_from_file(path);
    }

    if env_configured() {
        tracing::info!("Configuration loaded from environment variables");
        return load_from_env();
    }

    match probe_config_paths() {
        Some(found) => load_from_file(Some(found)),
        None => Err(AuthError::Config(format!(
            "no configuration found: pass --config, set {ENV_CLIENT_ID} and friends, \
             or create one of {}",
            CONFIG_FILE_NAMES.join(", ")
        ))),
    }
}

/// Load configuration from `LOOPAUTH_*` environment variables.
///
/// # Errors
/// Returns `AuthError::MissingConfigField` naming the first absent key.
pub fn load_from_env() -> Result<ProviderConfig> {
    let raw = RawProviderConfig {
        authorization_endpoint: env_var(ENV_AUTHORIZATION_ENDPOINT),
        token_endpoint: env_var(ENV_TOKEN_ENDPOINT),
        client_id: env_var(ENV_CLIENT_ID),
        client_secret: env_var(ENV_CLIENT_SECRET),
        redirect_uri: env_var(ENV_REDIRECT_URI),
        scope: env_var(ENV_SCOPE).map(ScopeValue::Joined),
        refresh_token_scope: env_var(ENV_REFRESH_TOKEN_SCOPE),
    };
    ProviderConfig::from_raw(raw)
}

/// Load configuration from a file.
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `AuthError::Config` if the file is missing, unreadable or
/// malformed; validation errors propagate from [`ProviderConfig::from_raw`].
pub fn load_from_file(path: Option<PathBuf>) -> Result<ProviderConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AuthError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AuthError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AuthError::Config(format!("Failed to read config file: {e}")))?;

    ProviderConfig::from_raw(parse_config(&contents, &config_path)?)
}

/// Parse the raw mapping; format is chosen by extension (`.json` default).
///
/// # Errors
/// Returns `AuthError::Config` for syntax errors or unsupported extensions.
pub fn parse_config(contents: &str, path: &Path) -> Result<RawProviderConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AuthError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AuthError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AuthError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the working directory or next to the
/// executable.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(CONFIG_FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.is_file())
}

fn env_configured() -> bool {
    ENV_KEYS.iter().any(|key| env_var(key).is_some())
}

/// Non-empty value of `key`.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
