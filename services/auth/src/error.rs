//! Error type for authentication and account management

use common::PlatformError;
use common::error::StatusCode;
use thiserror::Error;

/// Errors surfaced by the authentication store and user management
#[derive(Error, Debug)]
pub enum AuthError {
    /// Form input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Signed in, but no host row is linked to the account
    #[error("No profile is linked to this account")]
    ProfileNotFound,

    #[error("This role is no longer supported")]
    UnsupportedRole,

    #[error("{0}")]
    Forbidden(String),

    #[error("Session storage error: {0}")]
    SessionStorage(String),

    #[error("Invalid access token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to logout")]
    Logout,

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl AuthError {
    /// Map a sign-in failure, turning a rejected password grant into `InvalidCredentials`
    pub fn from_sign_in(err: PlatformError) -> Self {
        match err {
            PlatformError::Api { status, .. }
                if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED =>
            {
                AuthError::InvalidCredentials
            }
            other => AuthError::Platform(other),
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::SessionStorage(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::SessionStorage(err.to_string())
    }
}

/// Type alias for Result with AuthError
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_password_grant_is_invalid_credentials() {
        let err = PlatformError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert!(matches!(AuthError::from_sign_in(err), AuthError::InvalidCredentials));
    }

    #[test]
    fn test_other_failures_are_kept() {
        let err = PlatformError::Realtime("closed".to_string());
        assert!(matches!(AuthError::from_sign_in(err), AuthError::Platform(_)));
    }
}
