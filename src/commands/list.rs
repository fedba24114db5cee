//! Interactive issue search and listing.

use console::{style, Color};
use dialoguer::{theme::ColorfulTheme, Input, Select};

use super::prompt_error;
use crate::api::types::Issue;
use crate::api::JiraClient;
use crate::error::Result;
use crate::ui;

/// User-scoped filter choices offered by the search flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserFilter {
    ReportedByMe,
    AssignedToMe,
    All,
}

impl UserFilter {
    const LABELS: [&'static str; 3] = [
        "Issues reported by me",
        "Issues assigned to me",
        "All issues (no user filter)",
    ];

    fn from_index(index: usize) -> Self {
        match index {
            0 => UserFilter::ReportedByMe,
            1 => UserFilter::AssignedToMe,
            _ => UserFilter::All,
        }
    }
}

/// Run the interactive search flow.
pub async fn run(client: &JiraClient) -> Result<()> {
    println!(
        "{}",
        style("JIRA Issue Lister - search and display issues").blue().bold()
    );

    ui::step("Step 1: Project selection");
    let project_key: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Project key (blank for all projects)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;
    let project_key = project_key.trim().to_uppercase();

    ui::step("Step 2: Filter selection");
    let filter_idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("User filter")
        .items(&UserFilter::LABELS)
        .default(2)
        .interact()
        .map_err(prompt_error)?;
    let user_filter = UserFilter::from_index(filter_idx);

    ui::step("Step 3: Status filter");
    let status: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Status (e.g. Open, In Progress; blank for all)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;
    let status = status.trim();

    let Some(jql) = build_jql(&project_key, user_filter, status) else {
        ui::error("At least one search criterion must be provided.");
        ui::info("Specify a project, a user filter, or a status.");
        return Ok(());
    };

    ui::step("Step 4: Executing search");
    ui::info(&format!("JQL query: {}", jql));
    let pb = ui::spinner("Searching JIRA issues");
    let result = client.search_issues(&jql).await;
    pb.finish_and_clear();

    display_issues(&result?.issues);
    Ok(())
}

/// Join the selected criteria into a JQL query.
///
/// Returns `None` when every criterion is blank; an unconstrained search is
/// refused rather than sent.
fn build_jql(project_key: &str, user_filter: UserFilter, status: &str) -> Option<String> {
    let mut clauses = Vec::new();

    if !project_key.is_empty() {
        clauses.push(format!(r#"project = "{}""#, project_key));
    }

    match user_filter {
        UserFilter::ReportedByMe => clauses.push("reporter = currentUser()".to_string()),
        UserFilter::AssignedToMe => clauses.push("assignee = currentUser()".to_string()),
        UserFilter::All => {}
    }

    if !status.is_empty() {
        clauses.push(format!(r#"status = "{}""#, status));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

/// Render the search results.
fn display_issues(issues: &[Issue]) {
    ui::step("Step 5: Results");

    if issues.is_empty() {
        ui::warning("No issues found matching your criteria.");
        return;
    }

    ui::success(&format!("Found {} issue(s):", issues.len()));
    println!("{}", style("=".repeat(80)).bold());

    for (i, issue) in issues.iter().enumerate() {
        let status = issue.status_name();
        println!(
            "{}",
            style(format!("{:2}. [{}]", i + 1, issue.key)).bold()
        );
        println!("    {} {}", style("Summary:").bold(), issue.fields.summary);
        println!(
            "    {} {}",
            style("Status:").bold(),
            style(status).fg(status_color(status))
        );
        println!("    {} {}", style("Assignee:").bold(), issue.assignee_name());
        println!("    {} {}", style("Priority:").bold(), issue.priority_name());
        println!();
    }
}

/// Status-dependent display color: waiting yellow, active blue, finished
/// green.
fn status_color(status: &str) -> Color {
    match status.to_lowercase().as_str() {
        "open" | "to do" => Color::Yellow,
        "in progress" | "in review" => Color::Blue,
        "done" | "closed" | "resolved" => Color::Green,
        _ => Color::White,
    }
}
