//! API error types for the JIRA client.

use thiserror::Error;

/// Errors that can occur when talking to the JIRA REST API.
///
/// This is a closed taxonomy: every failure of the request layer maps to
/// exactly one variant, constructed at the failure site and propagated
/// unmodified to the CLI boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed - invalid or expired API token (HTTP 401).
    #[error("Authentication failed: invalid credentials")]
    Unauthorized,

    /// Permission denied - the token is valid but lacks access (HTTP 403).
    #[error("Permission denied: you don't have access to this resource")]
    Forbidden,

    /// Resource not found (HTTP 404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Any other API-level failure, carrying the status and response body.
    #[error("JIRA API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport-level failure: timeout, DNS/connect failure, TLS failure.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Input validation failure. Never reaches the network layer.
    #[error("Validation error for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A 2xx response whose body could not be parsed as JSON.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Keyring error when storing or retrieving tokens.
    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from a non-success HTTP status code.
    ///
    /// `context` is a resource-specific description used for 404s and
    /// carried as the body for other statuses.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(context.to_string()),
            code => ApiError::Api {
                status: code,
                body: context.to_string(),
            },
        }
    }

    /// Create a validation error for a named input field.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
