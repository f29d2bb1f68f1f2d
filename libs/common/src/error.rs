//! Custom error types for the common library
//!
//! This module defines the error taxonomy of the platform client. Every
//! remote call made by the workspace ends up in one of these variants.

pub use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Code the table API returns when a single-row request matched no row
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Custom error type for platform operations
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Configuration error
    #[error("Platform configuration error: {0}")]
    Configuration(String),

    /// Error occurred while talking to the platform
    #[error("Platform connection error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-success status
    #[error("Platform error ({status}): {message}")]
    Api {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    /// A single-row lookup matched nothing
    #[error("Row not found in {0}")]
    NotFound(String),

    /// A single-row lookup matched more than one row
    #[error("Expected a single row from {0}, got several")]
    MultipleRows(String),

    /// The response body did not have the expected shape
    #[error("Failed to decode platform response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Realtime channel failure
    #[error("Realtime error: {0}")]
    Realtime(String),
}

impl PlatformError {
    /// True when the error means "no such row" rather than a failure
    pub fn is_not_found(&self) -> bool {
        match self {
            PlatformError::NotFound(_) => true,
            PlatformError::Api { code, .. } => code.as_deref() == Some(NO_ROWS_CODE),
            _ => false,
        }
    }

    /// Build an `Api` error from a status and a raw response body
    ///
    /// The table API, the session API and the storage API each use their own
    /// error body; all of them are folded into `code` + `message`.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();

        let (code, message) = match parsed {
            Some(body) => {
                let code = body
                    .code
                    .map(|c| match c {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .or(body.error_code);
                let message = body
                    .message
                    .or(body.msg)
                    .or(body.error_description)
                    .or(body.error)
                    .unwrap_or_else(|| default_message(status));
                (code, message)
            }
            None if body.trim().is_empty() => (None, default_message(status)),
            None => (None, body.trim().to_string()),
        };

        PlatformError::Api {
            status,
            code,
            message,
        }
    }
}

fn default_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<serde_json::Value>,
    error_code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Type alias for Result with PlatformError
pub type PlatformResult<T> = Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_api_error_body() {
        let err = PlatformError::from_response(
            StatusCode::NOT_ACCEPTABLE,
            r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#,
        );

        assert!(err.is_not_found());
        match err {
            PlatformError::Api { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("PGRST116"));
                assert!(message.starts_with("JSON object requested"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_session_api_error_body() {
        let err = PlatformError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );

        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Platform error (400 Bad Request): Invalid login credentials"
        );
    }

    #[test]
    fn test_numeric_code_and_msg() {
        let err = PlatformError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"msg":"Password should be at least 6 characters"}"#,
        );

        match err {
            PlatformError::Api { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("422"));
                assert_eq!(message, "Password should be at least 6 characters");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = PlatformError::from_response(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.to_string(), "Platform error (401 Unauthorized): Unauthorized");
    }
}
