//! Domain types and models

pub mod callback;
pub mod http;
pub mod tokens;

pub use callback::{CallbackOutcome, CallbackRedirect};
pub use http::{ApiRequest, ApiResponse, HttpMethod, RequestOptions};
pub use tokens::{TokenResponse, TokenSet};
