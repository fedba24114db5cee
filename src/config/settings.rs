//! Application settings configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Application-wide settings, stored as TOML in the user config directory.
///
/// Everything here can be overridden per invocation: the URL by `--jira-url`
/// or `JIRA_URL`, TLS verification by `--no-verify-tls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default JIRA instance URL.
    pub url: Option<String>,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
    /// Total attempts per API request.
    pub max_retries: u32,
    /// Base delay between retries in milliseconds. Doubles per attempt.
    pub retry_base_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: None,
            verify_tls: true,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

impl Settings {
    /// Load settings from the default location.
    ///
    /// Returns defaults when no settings file exists yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file()?)
    }

    /// Load settings from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Ok(toml::from_str(&contents)?)
    }

    /// The path of the settings file.
    pub fn config_file() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("jiractl").join("config.toml"))
    }

    /// The retry policy expressed by these settings.
    pub fn retry_policy(&self) -> crate::api::RetryPolicy {
        crate::api::RetryPolicy {
            max_retries: self.max_retries.max(1),
            base_delay: std::time::Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}
