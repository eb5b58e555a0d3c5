//! Provider configuration loading
//!
//! Reads the provider mapping from environment variables or a JSON/TOML file
//! and validates it into a [`loopauth_domain::ProviderConfig`].

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, parse_config, probe_config_paths};
