//! Authentication error types.

use thiserror::Error;

use super::models::FieldErrors;
use crate::api::ApiError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// The service rejected the credentials or the sign-up; carries the
    /// server-provided message verbatim.
    #[error("{0}")]
    AuthenticationFailed(String),

    /// Registration form failed local validation; nothing was sent.
    #[error("{0}")]
    Validation(FieldErrors),

    /// Transport failure or an unreadable response from the service.
    #[error(transparent)]
    Api(ApiError),

    /// Session could not be persisted
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    /// Operation needs a logged-in principal
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Server { message, .. } => AuthError::AuthenticationFailed(message),
            other => AuthError::Api(other),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Session storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
