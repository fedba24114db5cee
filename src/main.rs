//! jiractl - an interactive command-line client for JIRA.
//!
//! Authenticates against a JIRA instance, then walks the user through
//! issue creation or search with guided prompts.

mod api;
mod commands;
mod config;
mod error;
mod logging;
mod ui;

use clap::{Parser, Subcommand};

use api::JiraClient;
use config::Settings;
use error::AppError;

#[derive(Parser)]
#[command(name = "jiractl", version, about = "Interactive command-line client for JIRA")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    /// Disable TLS certificate verification.
    #[arg(long, global = true)]
    no_verify_tls: bool,

    /// JIRA instance URL (overrides JIRA_URL and the settings file).
    #[arg(long, global = true)]
    jira_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Create a JIRA issue interactively.
    Create,
    /// Search and list JIRA issues.
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.debug) {
        // Logging is best-effort; the tool still works without it.
        eprintln!("Warning: failed to initialize logging: {:#}", e);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "command failed");
        match &e {
            AppError::Cancelled => ui::warning("Operation cancelled by user"),
            other => {
                ui::error(&other.user_message());
                if let Some(hint) = other.suggested_action() {
                    ui::info(hint);
                }
            }
        }
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    let settings = Settings::load()?;
    let verify_tls = settings.verify_tls && !cli.no_verify_tls;

    let creds = commands::resolve_credentials(cli.jira_url.as_deref(), &settings)?;
    let client = JiraClient::new(creds, verify_tls, settings.retry_policy())?;

    match cli.command {
        Command::Create => commands::create::run(&client).await,
        Command::List => commands::list::run(&client).await,
    }
}
