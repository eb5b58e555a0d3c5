//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use loopauth_domain::AuthError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AuthError);

impl From<InfraError> for AuthError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AuthError> for InfraError {
    fn from(value: AuthError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAuthError {
    fn into_auth(self) -> AuthError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AuthError */
/* -------------------------------------------------------------------------- */

impl IntoAuthError for HttpError {
    fn into_auth(self) -> AuthError {
        if self.is_timeout() {
            return AuthError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return AuthError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return AuthError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            return AuthError::Network(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        AuthError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_auth())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → AuthError */
/* -------------------------------------------------------------------------- */

impl IntoAuthError for IoError {
    fn into_auth(self) -> AuthError {
        match self.kind() {
            ErrorKind::PermissionDenied => AuthError::Storage(format!("permission denied: {self}")),
            ErrorKind::NotFound => AuthError::Storage(format!("not found: {self}")),
            _ => AuthError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        Self(value.into_auth())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → AuthError */
/* -------------------------------------------------------------------------- */

impl IntoAuthError for JsonError {
    fn into_auth(self) -> AuthError {
        if self.is_io() {
            return AuthError::Storage(self.to_string());
        }
        AuthError::Storage(format!("malformed JSON at line {}: {self}", self.line()))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        Self(value.into_auth())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
