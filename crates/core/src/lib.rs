//! # Loopauth Core
//!
//! Pure authorization logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for storage, HTTP, callback listener
//!   and browser
//! - The interactive authorization flow
//! - Session management (`obtain_session`, explicit refresh, logout)
//! - The authenticated request wrapper with single refresh-and-retry
//!
//! ## Architecture Principles
//! - Only depends on `loopauth-common` and `loopauth-domain`
//! - No filesystem, HTTP, or platform code
//! - All external dependencies via traits

pub mod auth;

// Re-export specific items to avoid ambiguity
pub use auth::ports::{
    BrowserLauncher, CallbackReceiver, HttpTransport, PendingCallback, TokenEndpoint, TokenStore,
};
pub use auth::{
    AttemptPhase, AuthenticatedClient, AuthorizationFlow, Session, SessionManager, SessionSource,
};
