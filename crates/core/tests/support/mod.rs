//! Shared test helpers for `loopauth-core` integration tests.
//!
//! In-memory fakes for every core port so that flow, session and request
//! wrapper tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod mocks;

use loopauth_domain::{ProviderConfig, TokenSet};

/// Provider configuration used across core tests.
pub fn provider_config() -> ProviderConfig {
    ProviderConfig::new(
        "https://p/authorize",
        "https://p/token",
        "abc",
        "http://localhost:4200/cb",
        vec!["read".to_string()],
    )
    .expect("valid test config")
}

/// Token set with both tokens present.
pub fn tokens(access: &str, refresh: &str) -> TokenSet {
    TokenSet::new(access, Some(refresh.to_string())).with_expires_in(3600)
}
