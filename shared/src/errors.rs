//! Error types for the AuthGate service

use thiserror::Error;

/// Authentication error taxonomy
///
/// Rejections (`InvalidCredentials`, `Unauthorized`, `MalformedToken`) never
/// say which check failed. `StorageUnavailable` and `Internal` are server-side
/// failures and must not be conflated with a rejected login.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Credential storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Unauthorized | AuthError::MalformedToken => "UNAUTHORIZED",
            AuthError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for normal authentication rejections, false for server-side failures
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::Unauthorized | AuthError::MalformedToken
        )
    }
}
