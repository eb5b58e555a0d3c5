//! Process exit codes, one per failure kind

use loopauth_domain::AuthError;

pub const FAILURE: u8 = 1;
pub const PROVIDER_DENIED: u8 = 3;
pub const CSRF_MISMATCH: u8 = 4;
pub const CALLBACK_TIMEOUT: u8 = 5;
pub const TOKEN_EXCHANGE: u8 = 6;
pub const NO_REFRESH_TOKEN: u8 = 7;
/// `EX_CONFIG` from sysexits.h
pub const CONFIG: u8 = 78;

pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<AuthError>().map_or(FAILURE, auth_exit_code)
}

pub const fn auth_exit_code(err: &AuthError) -> u8 {
    match err {
        AuthError::MissingConfigField(_) | AuthError::Config(_) => CONFIG,
        AuthError::ProviderDenied { .. } => PROVIDER_DENIED,
        AuthError::CsrfMismatch { .. } => CSRF_MISMATCH,
        AuthError::CallbackTimeout { .. } => CALLBACK_TIMEOUT,
        AuthError::TokenExchange { .. } | AuthError::InvalidTokenResponse { .. } => TOKEN_EXCHANGE,
        AuthError::NoRefreshToken => NO_REFRESH_TOKEN,
        AuthError::Callback(_)
        | AuthError::Network(_)
        | AuthError::Storage(_)
        | AuthError::Internal(_) => FAILURE,
    }
}
