//! Interactive issue creation.
//!
//! Walks the user through project, issue type, and field selection, builds
//! the `{"fields": {...}}` payload, and submits it after confirmation.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Editor, Input, Select};
use serde_json::{json, Map, Value};

use super::prompt_error;
use crate::api::types::FieldMeta;
use crate::api::JiraClient;
use crate::error::{AppError, Result};
use crate::ui;

/// Fields the server fills in itself; never prompted for.
const SYSTEM_FIELDS: [&str; 14] = [
    "project",
    "issuetype",
    "reporter",
    "creator",
    "status",
    "resolution",
    "watches",
    "worklog",
    "votes",
    "attachment",
    "subtasks",
    "timetracking",
    "progress",
    "aggregateprogress",
];

/// Schema types whose allowed values are submitted as `{"id": ...}`.
const ID_REFERENCE_TYPES: [&str; 5] = ["priority", "user", "component", "version", "option"];

/// Longest description shown verbatim in the confirmation summary.
const SUMMARY_DISPLAY_LIMIT: usize = 100;

/// Run the interactive creation flow.
pub async fn run(client: &JiraClient) -> Result<()> {
    println!(
        "{}",
        style("JIRA Issue Creator - guided issue creation").blue().bold()
    );

    ui::step("Step 1: Project selection");
    let project_key: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Project key")
        .interact_text()
        .map_err(prompt_error)?;
    let project_key = project_key.trim().to_uppercase();
    if project_key.is_empty() {
        ui::error("Project key cannot be empty");
        return Ok(());
    }

    ui::step("Step 2: Issue type selection");
    let pb = ui::spinner("Fetching available issue types");
    let issue_types = client.issue_types(&project_key).await;
    pb.finish_and_clear();

    let issue_types: Vec<_> = issue_types?
        .into_iter()
        .filter(|it| !it.subtask)
        .collect();
    if issue_types.is_empty() {
        ui::error(&format!(
            "No issue types available for project '{}'. Check the key and your create permission.",
            project_key
        ));
        return Ok(());
    }

    let type_names: Vec<&str> = issue_types.iter().map(|it| it.name.as_str()).collect();
    let type_idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Issue type")
        .items(&type_names)
        .default(0)
        .interact()
        .map_err(prompt_error)?;
    let issue_type = &issue_types[type_idx];
    ui::success(&format!("Selected: {}", issue_type.name));

    ui::step("Step 3: Field configuration");
    let pb = ui::spinner("Fetching field configuration");
    let fields = client.create_fields(&project_key, &issue_type.id).await;
    pb.finish_and_clear();

    let (required, optional) = partition_fields(fields?);
    let mut values = Map::new();

    ui::step("Step 4: Required fields");
    ui::info(&format!("Please fill in {} required field(s):", required.len()));
    for (i, field) in required.iter().enumerate() {
        println!("{}", style(format!("  [{}/{}]", i + 1, required.len())).blue());
        loop {
            if let Some(value) = field_value(field)? {
                values.insert(field.field_id.clone(), value);
                break;
            }
            ui::warning("This field is required. Please provide a value.");
        }
    }

    if !optional.is_empty() {
        ui::step("Step 5: Optional fields");
        ui::info(&format!(
            "There are {} optional field(s) available",
            optional.len()
        ));
        for field in &optional {
            let choice = Select::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Set '{}'?", field.name))
                .items(&["Set", "Skip", "Skip all remaining"])
                .default(1)
                .interact()
                .map_err(prompt_error)?;
            match choice {
                0 => {
                    if let Some(value) = field_value(field)? {
                        values.insert(field.field_id.clone(), value);
                    }
                }
                1 => continue,
                _ => {
                    ui::info("Skipping remaining optional fields");
                    break;
                }
            }
        }
    }

    let payload = build_payload(&project_key, &issue_type.id, values);

    ui::step("Step 6: Confirmation");
    println!("{}", style("About to create this issue:").bold());
    println!("{}", "-".repeat(60));
    if let Some(fields) = payload["fields"].as_object() {
        for (key, value) in fields {
            println!(
                "  {} : {}",
                style(format!("{:<18}", key)).blue(),
                display_value(key, value)
            );
        }
    }
    println!("{}", "-".repeat(60));

    let proceed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Proceed with issue creation?")
        .interact()
        .map_err(prompt_error)?;
    if !proceed {
        ui::info("Issue creation cancelled");
        return Err(AppError::Cancelled);
    }

    ui::step("Step 7: Creating issue");
    let pb = ui::spinner("Creating issue in JIRA");
    let created = client.create_issue(&payload).await;
    pb.finish_and_clear();
    let created = created?;

    ui::success("Issue created successfully!");
    println!("{} {}", style("Issue key:").bold(), style(&created.key).green());
    println!(
        "{} {}",
        style("URL:").bold(),
        style(format!("{}/browse/{}", client.base_url(), created.key)).blue()
    );
    Ok(())
}

/// Split field metadata into required and optional, dropping system fields.
fn partition_fields(fields: Vec<FieldMeta>) -> (Vec<FieldMeta>, Vec<FieldMeta>) {
    fields
        .into_iter()
        .filter(|f| !SYSTEM_FIELDS.contains(&f.field_id.as_str()))
        .partition(|f| f.required)
}

/// Prompt for one field and shape the input per its schema.
///
/// Returns `Ok(None)` when the user skipped an optional field or gave no
/// input.
fn field_value(field: &FieldMeta) -> Result<Option<Value>> {
    println!("\n{}", style(format!("Field: {}", field.name)).bold());
    if field.required {
        println!("{}", style("(Required)").yellow());
    } else {
        println!("{}", style("(Optional - leave empty to skip)").blue());
    }

    if !field.allowed_values.is_empty() {
        let labels: Vec<String> = field
            .allowed_values
            .iter()
            .map(allowed_value_label)
            .collect();
        let idx = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Select a value for '{}'", field.name))
            .items(&labels)
            .default(0)
            .interact()
            .map_err(prompt_error)?;
        return Ok(Some(shape_allowed_value(
            &field.schema.field_type,
            &field.allowed_values[idx],
        )));
    }

    if field.schema.field_type == "array" {
        let example = match field.schema.items.as_deref() {
            Some("user") => "user1,user2",
            _ => "component1,component2",
        };
        let raw: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} (comma-separated, e.g. {})", field.name, example))
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        return Ok(shape_array_values(field.schema.items.as_deref(), &raw));
    }

    if field.field_id == "description" {
        ui::info("Opening editor for Description... (save and close to continue)");
        let edited = Editor::new().edit("").map_err(prompt_error)?;
        let content = edited.map(|c| c.trim().to_string()).unwrap_or_default();
        if content.is_empty() {
            return Ok(None);
        }
        ui::success("Description captured");
        return Ok(Some(Value::String(content)));
    }

    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Enter {}", field.name))
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;
    let raw = raw.trim();
    if raw.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::String(raw.to_string())))
    }
}

/// Display label for one entry of an allowedValues list.
fn allowed_value_label(value: &Value) -> String {
    value
        .get("name")
        .or_else(|| value.get("value"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string()
}

/// Shape a selected allowed value for the creation payload.
///
/// Reference-style schema types are submitted as `{"id": ...}`; plain
/// option lists submit the value itself.
fn shape_allowed_value(field_type: &str, selected: &Value) -> Value {
    if ID_REFERENCE_TYPES.contains(&field_type) {
        json!({ "id": selected["id"] })
    } else {
        selected
            .get("value")
            .or_else(|| selected.get("name"))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// Shape comma-separated input for an array field.
///
/// Component and version items become `{"name": ...}` objects; everything
/// else is submitted as plain strings. Blank input yields `None`.
fn shape_array_values(items: Option<&str>, raw: &str) -> Option<Value> {
    let parts: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        return None;
    }

    let values = match items {
        Some("component") | Some("version") => parts
            .into_iter()
            .map(|name| json!({ "name": name }))
            .collect(),
        _ => parts
            .into_iter()
            .map(|v| Value::String(v.to_string()))
            .collect::<Vec<_>>(),
    };
    Some(Value::Array(values))
}

/// Assemble the final creation payload.
fn build_payload(project_key: &str, issue_type_id: &str, values: Map<String, Value>) -> Value {
    let mut fields = Map::new();
    fields.insert("project".into(), json!({ "key": project_key }));
    fields.insert("issuetype".into(), json!({ "id": issue_type_id }));
    fields.extend(values);
    json!({ "fields": fields })
}

/// Render a field value for the confirmation summary, truncating long
/// descriptions.
fn display_value(key: &str, value: &Value) -> String {
    if key == "description" {
        if let Some(text) = value.as_str() {
            if text.chars().count() > SUMMARY_DISPLAY_LIMIT {
                let cut: String = text.chars().take(SUMMARY_DISPLAY_LIMIT).collect();
                return format!("{}...", cut);
            }
            return text.to_string();
        }
    }
    value.to_string()
}
