//! HTTP client used for the token endpoint and authenticated API calls

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
