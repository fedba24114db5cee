//! Interactive commands and credential acquisition.

pub mod create;
pub mod list;

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};

use crate::api::{auth, Credentials};
use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::ui;

/// Resolve credentials for this session.
///
/// URL precedence: `--jira-url` flag, then `JIRA_URL`, then the settings
/// file, then an interactive prompt. Token precedence: `JIRA_TOKEN`, then
/// the OS keyring, then a hidden interactive prompt (with an offer to store
/// the token in the keyring for next time).
///
/// The result is validated and normalized; no later operation can see a
/// malformed URL or token.
pub fn resolve_credentials(
    url_override: Option<&str>,
    settings: &Settings,
) -> Result<Credentials> {
    let url = match url_override
        .map(str::to_string)
        .or_else(|| non_empty_env("JIRA_URL"))
        .or_else(|| settings.url.clone())
    {
        Some(url) => url,
        None => prompt_url()?,
    };

    let token = match non_empty_env("JIRA_TOKEN") {
        Some(token) => token,
        None => match auth::stored_token() {
            Some(token) => {
                tracing::info!("Token loaded from system keyring");
                token
            }
            None => prompt_token()?,
        },
    };

    Ok(Credentials::new(&url, &token)?)
}

/// Read an environment variable, treating blank values as unset.
fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn prompt_url() -> Result<String> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt("JIRA URL")
        .interact_text()
        .map_err(prompt_error)
}

fn prompt_token() -> Result<String> {
    let token: String = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("JIRA API token")
        .interact()
        .map_err(prompt_error)?;

    let save = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save token to the system keyring for future use?")
        .default(false)
        .interact()
        .map_err(prompt_error)?;

    if save {
        match auth::store_token(&token) {
            Ok(()) => ui::success("Token saved to system keyring"),
            Err(e) => ui::warning(&format!("Could not save token: {}", e)),
        }
    }

    Ok(token)
}

/// Map a dialoguer error, treating an interrupt (Ctrl-C / Esc) as a clean
/// cancellation.
pub(crate) fn prompt_error(err: dialoguer::Error) -> AppError {
    match err {
        dialoguer::Error::IO(ref io) if io.kind() == std::io::ErrorKind::Interrupted => {
            AppError::Cancelled
        }
        other => AppError::Prompt(other),
    }
}
