//! Common building blocks shared across loopauth crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: PKCE, CSRF state and authorization URL construction (pure,
//!   no I/O, no tracing)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod auth;

// Re-export commonly used types and functions for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use auth::{build_authorization_url, AuthorizationAttempt, PkceParams};
