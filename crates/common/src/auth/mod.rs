//! OAuth 2.0 + PKCE primitives
//!
//! Pure building blocks for one authorization attempt: the PKCE pair, the CSRF
//! state and the authorization URL. Network and listener code lives in
//! `loopauth-infra`; orchestration lives in `loopauth-core`.
//!
//! # Module Organization
//!
//! - **[`pkce`]**: verifier/challenge generation, state generation and
//!   constant-time validation, `AuthorizationAttempt`
//! - **[`authorize_url`]**: authorization URL construction

pub mod authorize_url;
pub mod pkce;

// Re-export commonly used types and functions
pub use authorize_url::build_authorization_url;
pub use pkce::{
    derive_code_challenge, generate_code_verifier, generate_state, is_valid_code_verifier,
    validate_state, AuthorizationAttempt, PkceParams,
};
