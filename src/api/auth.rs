//! Authentication handling for the JIRA API.
//!
//! This module owns credential validation and normalization (URL and bearer
//! token) and secure token storage via the OS keyring.

use super::error::{ApiError, Result};

/// The keyring service name for jiractl tokens.
const KEYRING_SERVICE: &str = "jiractl";

/// Minimum plausible token length after trimming.
///
/// A heuristic floor to catch obviously truncated paste errors, not a
/// cryptographic check.
const MIN_TOKEN_LEN: usize = 10;

/// Validated credentials for a JIRA instance.
///
/// Constructed once per session via [`Credentials::new`], which normalizes
/// both fields; a `Credentials` value in hand means no malformed URL or
/// token can ever reach the network layer. Never persisted by this module.
#[derive(Clone)]
pub struct Credentials {
    url: String,
    token: String,
}

impl Credentials {
    /// Validate and normalize a URL/token pair.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if either input fails validation.
    pub fn new(url: &str, token: &str) -> Result<Self> {
        Ok(Self {
            url: validate_url(url)?,
            token: validate_token(token)?,
        })
    }

    /// The normalized base URL (explicit scheme, no trailing slash).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The `Authorization` header value for HTTP requests.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// Keep tokens out of debug output and logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Validate and normalize a JIRA instance URL.
///
/// Trims whitespace, prepends `https://` when no explicit scheme is present,
/// and strips exactly one trailing slash. Pure: no network access.
///
/// # Errors
///
/// Returns `ApiError::Validation` if the URL is empty after trimming.
pub fn validate_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::validation("url", "URL cannot be empty"));
    }

    let url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };

    Ok(url.strip_suffix('/').unwrap_or(&url).to_string())
}

/// Validate a JIRA API token.
///
/// Returns the trimmed token unchanged when it passes.
///
/// # Errors
///
/// Returns `ApiError::Validation` if the token is empty after trimming or
/// shorter than the minimum plausible length.
pub fn validate_token(token: &str) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::validation("token", "token cannot be empty"));
    }

    if token.len() < MIN_TOKEN_LEN {
        return Err(ApiError::validation(
            "token",
            "token appears to be too short",
        ));
    }

    Ok(token.to_string())
}

/// Store an API token in the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be stored in the keyring.
pub fn store_token(token: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, "token")
        .map_err(|e| ApiError::Keyring(format!("failed to create keyring entry: {}", e)))?;

    entry
        .set_password(token)
        .map_err(|e| ApiError::Keyring(format!("failed to store token: {}", e)))?;

    Ok(())
}

/// Retrieve the API token from the OS keyring, if one was stored.
pub fn stored_token() -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, "token").ok()?;
    entry.get_password().ok()
}
