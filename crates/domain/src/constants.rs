//! Protocol constants
//!
//! Centralized location for the defaults of the authorization code flow.

// Callback listener
pub const DEFAULT_CALLBACK_PORT: u16 = 4200;
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;
pub const CALLBACK_BIND_HOST: &str = "127.0.0.1";

// Token handling
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
pub const DEFAULT_TOKEN_FILE: &str = "tokens.json";
pub const DEFAULT_CONFIG_FILE: &str = ".config.json";

// PKCE (RFC 7636)
pub const PKCE_VERIFIER_BYTES: usize = 32;
pub const PKCE_VERIFIER_MIN_LEN: usize = 43;
pub const PKCE_VERIFIER_MAX_LEN: usize = 128;
pub const CODE_CHALLENGE_METHOD: &str = "S256";
pub const STATE_BYTES: usize = 32;

// OAuth 2.0 grant types
pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

// Number of characters of a token shown in logs and status output
pub const TOKEN_DISPLAY_PREFIX: usize = 20;
