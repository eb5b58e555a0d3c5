//! # Loopauth Domain
//!
//! Domain types for the OAuth 2.0 authorization code flow with PKCE.
//!
//! This crate contains:
//! - Provider configuration and its validation
//! - Token types (persisted and wire shapes)
//! - Callback outcomes and transport-neutral request/response types
//! - The error enum and `Result` alias shared by every other crate
//!
//! ## Architecture
//! - No dependencies on other loopauth crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
