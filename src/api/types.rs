//! JIRA API request and response types.
//!
//! These types model the JIRA REST API v2 responses consumed by the
//! interactive flows: create metadata, field metadata, search results, and
//! the created-issue receipt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A page of values from the createmeta endpoints.
///
/// Returned by `GET /rest/api/2/issue/createmeta/{projectKey}/issuetypes`
/// and `.../issuetypes/{issueTypeId}` alike; only `values` matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaPage<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
}

/// An issue type available for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueType {
    /// The issue type ID.
    pub id: String,
    /// The display name (e.g., "Bug", "Story").
    pub name: String,
    /// Whether this is a subtask type. Subtask types are not offered for
    /// top-level creation.
    #[serde(default)]
    pub subtask: bool,
}

/// Create metadata for a single field of an issue type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    /// The field ID used as the key in the creation payload.
    pub field_id: String,
    /// The human-readable field name.
    pub name: String,
    /// Whether the field must be supplied on creation.
    #[serde(default)]
    pub required: bool,
    /// The field's schema (type and item type for arrays).
    #[serde(default)]
    pub schema: FieldSchema,
    /// Fixed set of allowed values, when the field is enumerated.
    #[serde(default)]
    pub allowed_values: Vec<Value>,
}

/// Schema portion of a field's create metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldSchema {
    /// The value type (e.g., "string", "array", "priority", "user").
    #[serde(default, rename = "type")]
    pub field_type: String,
    /// For arrays, the element type (e.g., "component", "version").
    #[serde(default)]
    pub items: Option<String>,
}

/// Search result from a JQL query.
///
/// Returned by `GET /rest/api/2/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    /// The matching issues, projected to the requested fields.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// A JIRA issue as returned by search.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    /// The issue key (e.g., "PROJ-123").
    pub key: String,
    /// The projected fields.
    pub fields: IssueFields,
}

/// The field projection requested by the search call.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    pub status: Option<NamedField>,
    pub assignee: Option<UserField>,
    pub reporter: Option<UserField>,
    pub priority: Option<NamedField>,
}

/// A field carrying only a display name (status, priority).
#[derive(Debug, Clone, Deserialize)]
pub struct NamedField {
    pub name: String,
}

/// A user reference (assignee, reporter).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserField {
    pub display_name: String,
}

impl Issue {
    /// Status display name, or "Unknown" when the field was not returned.
    pub fn status_name(&self) -> &str {
        self.fields.status.as_ref().map_or("Unknown", |s| &s.name)
    }

    /// Assignee display name, or "Unassigned".
    pub fn assignee_name(&self) -> &str {
        self.fields
            .assignee
            .as_ref()
            .map_or("Unassigned", |a| &a.display_name)
    }

    /// Priority display name, or "None".
    pub fn priority_name(&self) -> &str {
        self.fields.priority.as_ref().map_or("None", |p| &p.name)
    }
}

/// Receipt returned by `POST /rest/api/2/issue`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
    /// The new issue's ID.
    pub id: String,
    /// The new issue's key (e.g., "PROJ-124").
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_issue_type_page() {
        let json = r#"{
            "values": [
                {"id": "10001", "name": "Bug", "subtask": false},
                {"id": "10003", "name": "Sub-task", "subtask": true}
            ]
        }"#;

        let page: MetaPage<IssueType> = serde_json::from_str(json).unwrap();
        assert_eq!(page.values.len(), 2);
        assert_eq!(page.values[0].name, "Bug");
        assert!(page.values[1].subtask);
    }

    #[test]
    fn test_deserialize_meta_page_missing_values() {
        let page: MetaPage<IssueType> = serde_json::from_str("{}").unwrap();
        assert!(page.values.is_empty());
    }

    #[test]
    fn test_deserialize_field_meta() {
        let json = r#"{
            "fieldId": "priority",
            "name": "Priority",
            "required": true,
            "schema": {"type": "priority"},
            "allowedValues": [{"id": "1", "name": "Highest"}]
        }"#;

        let field: FieldMeta = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_id, "priority");
        assert!(field.required);
        assert_eq!(field.schema.field_type, "priority");
        assert_eq!(field.allowed_values.len(), 1);
    }

    #[test]
    fn test_deserialize_field_meta_array_schema() {
        let json = r#"{
            "fieldId": "components",
            "name": "Components",
            "schema": {"type": "array", "items": "component"}
        }"#;

        let field: FieldMeta = serde_json::from_str(json).unwrap();
        assert!(!field.required);
        assert_eq!(field.schema.field_type, "array");
        assert_eq!(field.schema.items.as_deref(), Some("component"));
        assert!(field.allowed_values.is_empty());
    }

    #[test]
    fn test_deserialize_search_result() {
        let json = r#"{
            "issues": [{
                "key": "PROJ-1",
                "fields": {
                    "summary": "Fix login",
                    "status": {"name": "In Progress"},
                    "assignee": {"displayName": "Jane Doe"},
                    "reporter": {"displayName": "John Roe"},
                    "priority": {"name": "High"}
                }
            }]
        }"#;

        let result: SearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.key, "PROJ-1");
        assert_eq!(issue.status_name(), "In Progress");
        assert_eq!(issue.assignee_name(), "Jane Doe");
        assert_eq!(issue.priority_name(), "High");
    }

    #[test]
    fn test_issue_accessors_handle_missing_fields() {
        let json = r#"{
            "key": "PROJ-2",
            "fields": {"summary": "Orphan", "status": null, "assignee": null,
                       "reporter": null, "priority": null}
        }"#;

        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.status_name(), "Unknown");
        assert_eq!(issue.assignee_name(), "Unassigned");
        assert_eq!(issue.priority_name(), "None");
    }

    #[test]
    fn test_deserialize_created_issue() {
        let json = r#"{"id": "10500", "key": "PROJ-124", "self": "https://x/rest/api/2/issue/10500"}"#;
        let created: CreatedIssue = serde_json::from_str(json).unwrap();
        assert_eq!(created.key, "PROJ-124");
    }
}
