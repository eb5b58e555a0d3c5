//! Authorization flow, session management and the authenticated request
//! wrapper.

pub mod client;
pub mod flow;
pub mod ports;
pub mod session;

pub use client::AuthenticatedClient;
pub use flow::{AttemptPhase, AuthorizationFlow};
pub use session::{Session, SessionManager, SessionSource};
