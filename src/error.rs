//! Centralized error types for jiractl.
//!
//! Aggregates the layer-specific errors into one type the CLI boundary can
//! branch on to produce user-facing messages, remediation hints, and exit
//! codes.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Prompt/terminal interaction errors.
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// The user cancelled the current operation.
    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => format!("Configuration problem: {}", e),
            AppError::Api(e) => match e {
                ApiError::Unauthorized => {
                    "Authentication failed. Your API token was rejected.".to_string()
                }
                ApiError::Forbidden => {
                    "Access denied. You don't have permission for this resource.".to_string()
                }
                ApiError::NotFound(resource) => format!("Not found: {}.", resource),
                ApiError::Api { status, body } => {
                    format!("JIRA rejected the request (HTTP {}): {}", status, body)
                }
                ApiError::Connection(msg) => format!("Connection failed: {}.", msg),
                ApiError::Validation { field, reason } => {
                    format!("Invalid {}: {}.", field, reason)
                }
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from JIRA. Please try again.".to_string()
                }
                ApiError::Keyring(_) => {
                    "Could not access the system keyring.".to_string()
                }
            },
            AppError::Prompt(e) => format!("Prompt failed: {}", e),
            AppError::Cancelled => "Operation cancelled.".to_string(),
        }
    }

    /// Get a suggested remediation for the user, when one exists.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Api(ApiError::Unauthorized) | AppError::Api(ApiError::Forbidden) => {
                Some("Check your JIRA token (JIRA_TOKEN) and that it has not expired.")
            }
            AppError::Api(ApiError::Connection(_)) => {
                Some("Check your network connection and the JIRA URL.")
            }
            AppError::Api(ApiError::Validation { .. }) => {
                Some("Fix the value and run the command again.")
            }
            AppError::Api(ApiError::Api { .. }) => {
                Some("Check your permissions and the data you submitted.")
            }
            AppError::Api(ApiError::Keyring(_)) => {
                Some("Set JIRA_TOKEN in the environment to bypass the keyring.")
            }
            _ => None,
        }
    }

    /// The process exit code for this error.
    ///
    /// Cancellation exits cleanly; everything else is a failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Cancelled => 0,
            _ => 1,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
