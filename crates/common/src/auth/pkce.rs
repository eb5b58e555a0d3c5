//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 (S256 only) plus the CSRF state token that travels with
//! every authorization attempt. All functions are pure apart from drawing
//! randomness from the thread-local CSPRNG.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use loopauth_domain::constants::{
    CODE_CHALLENGE_METHOD, PKCE_VERIFIER_BYTES, PKCE_VERIFIER_MAX_LEN, PKCE_VERIFIER_MIN_LEN,
    STATE_BYTES,
};
use loopauth_domain::{AuthError, Result};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure code verifier
///
/// 32 random bytes, base64url-encoded without padding (43 characters).
#[must_use]
pub fn generate_code_verifier() -> String {
    random_token(PKCE_VERIFIER_BYTES)
}

/// Derive the S256 code challenge for a verifier
///
/// `BASE64URL(SHA256(ASCII(code_verifier)))`, unpadded. Deterministic.
#[must_use]
pub fn derive_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generate a random state token for CSRF protection
#[must_use]
pub fn generate_state() -> String {
    random_token(STATE_BYTES)
}

/// Whether `verifier` satisfies the RFC 7636 length and alphabet rules.
#[must_use]
pub fn is_valid_code_verifier(verifier: &str) -> bool {
    (PKCE_VERIFIER_MIN_LEN..=PKCE_VERIFIER_MAX_LEN).contains(&verifier.len())
        && verifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

/// Compare the expected state with the one received on callback.
///
/// Uses a constant-time comparison.
#[must_use]
pub fn validate_state(expected: &str, actual: &str) -> bool {
    constant_time_eq(expected.as_bytes(), actual.as_bytes())
}

fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

/// Verifier/challenge pair for one authorization attempt
///
/// The verifier stays in memory until the code exchange and is never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct PkceParams {
    code_verifier: String,
    code_challenge: String,
}

impl PkceParams {
    /// Generate a fresh pair.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_verifier(generate_code_verifier())
    }

    /// Build a pair from an existing verifier.
    #[must_use]
    pub fn from_verifier(code_verifier: String) -> Self {
        let code_challenge = derive_code_challenge(&code_verifier);
        Self { code_verifier, code_challenge }
    }

    #[must_use]
    pub fn code_verifier(&self) -> &str {
        &self.code_verifier
    }

    #[must_use]
    pub fn code_challenge(&self) -> &str {
        &self.code_challenge
    }

    /// Always `"S256"`.
    #[must_use]
    pub const fn challenge_method(&self) -> &'static str {
        CODE_CHALLENGE_METHOD
    }

    /// Hand the verifier over for the code exchange, consuming the pair.
    #[must_use]
    pub fn into_verifier(self) -> String {
        self.code_verifier
    }
}

impl fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceParams")
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

/// Per-attempt secrets: the PKCE pair bound 1:1 to a CSRF state.
///
/// Created immediately before the authorization URL is built and consumed by
/// the code exchange. Never reused across attempts.
#[derive(Debug, Clone)]
pub struct AuthorizationAttempt {
    pkce: PkceParams,
    state: String,
}

impl AuthorizationAttempt {
    /// Generate a fresh PKCE pair and state.
    #[must_use]
    pub fn new() -> Self {
        Self { pkce: PkceParams::generate(), state: generate_state() }
    }

    /// Assemble an attempt from known values.
    #[must_use]
    pub fn from_parts(pkce: PkceParams, state: impl Into<String>) -> Self {
        Self { pkce, state: state.into() }
    }

    #[must_use]
    pub const fn pkce(&self) -> &PkceParams {
        &self.pkce
    }

    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Check the state echoed back by the provider.
    ///
    /// # Errors
    /// Returns `AuthError::CsrfMismatch` when the state is absent or differs.
    pub fn verify_state(&self, received: Option<&str>) -> Result<()> {
        match received {
            Some(actual) if validate_state(&self.state, actual) => Ok(()),
            _ => Err(AuthError::CsrfMismatch { received: received.map(str::to_string) }),
        }
    }

    /// Consume the attempt, releasing the verifier for the code exchange.
    #[must_use]
    pub fn into_verifier(self) -> String {
        self.pkce.into_verifier()
    }
}

impl Default for AuthorizationAttempt {
    fn default() -> Self {
        Self::new()
    }
}
