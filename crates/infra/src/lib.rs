//! # Loopauth Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The loopback callback listener (axum)
//! - The token endpoint client and API transport (reqwest)
//! - The JSON token file store
//! - Configuration loading (environment, JSON, TOML)
//! - The system browser launcher
//!
//! ## Architecture
//! - Implements traits defined in `loopauth-core`
//! - Contains all "impure" code (I/O, sockets, processes)

pub mod browser;
pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod storage;

pub use browser::SystemBrowser;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use oauth::{CallbackListener, CallbackServer, TokenEndpointClient};
pub use storage::FileTokenStore;
