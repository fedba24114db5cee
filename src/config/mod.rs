//! Configuration management for jiractl.
//!
//! This module handles loading the settings file. Credentials are never
//! stored here; the token lives in the OS keyring or the environment.

mod settings;

use thiserror::Error;

pub use settings::Settings;

/// Errors that can occur when handling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform configuration directory could not be determined.
    #[error("could not determine configuration directory")]
    NoConfigDir,

    /// The configuration file could not be read.
    #[error("could not read configuration file: {0}")]
    ReadError(std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("invalid configuration file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
