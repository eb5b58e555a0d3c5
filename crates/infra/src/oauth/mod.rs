//! OAuth adapters: loopback callback listener and token endpoint client

pub mod callback_server;
pub mod token_client;

pub use callback_server::{CallbackListener, CallbackServer};
pub use token_client::TokenEndpointClient;
