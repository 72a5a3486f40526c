use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle state of a board sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintState {
    Active,
    Closed,
    Future,
    #[serde(other)]
    Unknown,
}

impl SprintState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SprintState::Active => "active",
            SprintState::Closed => "closed",
            SprintState::Future => "future",
            SprintState::Unknown => "unknown",
        }
    }
}

/// A sprint from the agile board API (`/rest/agile/1.0/board/{id}/sprint`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub state: SprintState,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub complete_date: Option<String>,
    pub goal: Option<String>,
}

/// One page of board sprints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub is_last: bool,
    #[serde(default)]
    pub values: Vec<Sprint>,
}

/// One page of `/rest/api/2/search` results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub display_name: Option<String>,
    pub name: Option<String>,
    pub account_id: Option<String>,
}

impl User {
    /// Display name, falling back to the login name.
    pub fn label(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCategory {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub name: String,
    pub status_category: Option<StatusCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub name: String,
}

/// Issue fields. Anything not modelled explicitly (custom fields, `parent`,
/// epic links) lands in `custom` and is reached through [`IssueFields::field`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    pub summary: Option<String>,
    pub status: Option<Status>,
    pub assignee: Option<User>,
    pub reporter: Option<User>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub resolution: Option<Resolution>,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl IssueFields {
    /// Look up a loosely-typed field by id. JSON `null` reads as absent.
    pub fn field(&self, id: &str) -> Option<&Value> {
        self.custom.get(id).filter(|v| !v.is_null())
    }

    pub fn status_name(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.name.as_str())
    }

    pub fn category_name(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.status_category.as_ref())
            .map(|c| c.name.as_str())
    }
}

/// A single field change inside a history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub field: String,
    #[serde(default)]
    pub from: Value,
    #[serde(rename = "fromString", default)]
    pub from_label: Option<String>,
    #[serde(default)]
    pub to: Value,
    #[serde(rename = "toString", default)]
    pub to_label: Option<String>,
}

impl ChangeItem {
    /// The raw `to` value rendered as text (`""` when absent).
    pub fn to_text(&self) -> String {
        match &self.to {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A changelog history entry. Entries are not guaranteed to arrive in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub created: String,
    #[serde(default)]
    pub items: Vec<ChangeItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    pub histories: Vec<History>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
    pub changelog: Option<Changelog>,
}

impl Issue {
    /// Changelog histories, empty when the changelog was not expanded.
    pub fn histories(&self) -> &[History] {
        self.changelog
            .as_ref()
            .map(|c| c.histories.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub lead: Option<User>,
    #[serde(rename = "self")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_sprint() {
        let json = r#"{
            "id": 42,
            "self": "https://jira/rest/agile/1.0/sprint/42",
            "state": "closed",
            "name": "Sprint 42",
            "startDate": "2024-01-01T09:00:00.000Z",
            "endDate": "2024-01-15T09:00:00.000Z",
            "completeDate": "2024-01-15T10:00:00.000Z",
            "goal": "Ship login; Fix search"
        }"#;
        let sprint: Sprint = serde_json::from_str(json).unwrap();
        assert_eq!(sprint.id, 42);
        assert_eq!(sprint.state, SprintState::Closed);
        assert_eq!(sprint.goal.as_deref(), Some("Ship login; Fix search"));
    }

    #[test]
    fn test_unknown_sprint_state() {
        let sprint: Sprint = serde_json::from_str(r#"{"id": 1, "state": "archived"}"#).unwrap();
        assert_eq!(sprint.state, SprintState::Unknown);
        assert_eq!(sprint.name, "");
        assert!(sprint.start_date.is_none());
    }

    #[test]
    fn test_deserialize_issue_with_custom_fields() {
        let json = r#"{
            "key": "ABC-1",
            "fields": {
                "summary": "Login page",
                "status": {"name": "In Progress", "statusCategory": {"name": "In Progress"}},
                "assignee": {"displayName": "Dana"},
                "customfield_10004": 5,
                "customfield_17801": null,
                "parent": {"key": "ABC-100", "fields": {"summary": "Auth epic"}}
            },
            "changelog": {"histories": [
                {"created": "2024-01-05T00:00:00.000+0000",
                 "items": [{"field": "status", "fromString": "To Do", "toString": "In Progress", "to": "3"}]}
            ]}
        }"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.fields.status_name(), Some("In Progress"));
        assert_eq!(issue.fields.category_name(), Some("In Progress"));
        assert_eq!(issue.fields.field("customfield_10004"), Some(&Value::from(5)));
        assert!(issue.fields.field("customfield_17801").is_none());
        assert!(issue.fields.field("parent").is_some());
        assert_eq!(issue.histories().len(), 1);
        assert_eq!(issue.histories()[0].items[0].to_label.as_deref(), Some("In Progress"));
    }

    #[test]
    fn test_issue_without_changelog() {
        let issue: Issue = serde_json::from_str(r#"{"key": "ABC-2", "fields": {}}"#).unwrap();
        assert!(issue.histories().is_empty());
        assert!(issue.fields.status_name().is_none());
    }

    #[test]
    fn test_change_item_to_text() {
        let item: ChangeItem =
            serde_json::from_str(r#"{"field": "Sprint", "to": "12, 13"}"#).unwrap();
        assert_eq!(item.to_text(), "12, 13");
        let item: ChangeItem = serde_json::from_str(r#"{"field": "Sprint", "to": [12]}"#).unwrap();
        assert_eq!(item.to_text(), "[12]");
        let item: ChangeItem = serde_json::from_str(r#"{"field": "Sprint"}"#).unwrap();
        assert_eq!(item.to_text(), "");
    }

    #[test]
    fn test_user_label() {
        let user = User {
            display_name: None,
            name: Some("dana".into()),
            account_id: None,
        };
        assert_eq!(user.label(), Some("dana"));
        let user = User {
            display_name: Some(String::new()),
            name: None,
            account_id: None,
        };
        assert_eq!(user.label(), None);
    }
}
