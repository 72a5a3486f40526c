use serde_json::Value;

use crate::tracker::models::{Issue, IssueFields};

pub const UNASSIGNED: &str = "Unassigned";

/// Coerce a loosely-typed story-points value into a non-negative float.
///
/// Absent values are `0.0`. Numbers are taken as-is and strings are trimmed
/// and parsed; an empty string counts as absent. Anything else, negative or
/// non-finite values are rejected with a description of the offending value.
pub fn coerce_story_points(value: Option<&Value>) -> Result<f64, String> {
    let points = match value {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| n.to_string())?,
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| s.clone())?,
        Some(other) => return Err(other.to_string()),
    };
    if points.is_finite() && points >= 0.0 {
        Ok(points)
    } else {
        Err(points.to_string())
    }
}

/// Story points of an issue; coercion failures are logged and count as zero.
pub fn story_points(issue: &Issue, field_id: &str) -> f64 {
    match coerce_story_points(issue.fields.field(field_id)) {
        Ok(points) => points,
        Err(raw) => {
            log::warn!(
                "Could not convert story points '{raw}' on issue {}; using 0",
                issue.key
            );
            0.0
        }
    }
}

/// An epic reference found on an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct EpicLink {
    pub key: String,
    /// Set when the link value already embeds the epic's summary.
    pub title: Option<String>,
}

/// Try each candidate field in order; the first present, non-empty value wins.
///
/// Link values may be a bare key string or an object carrying `key`
/// (optionally with `fields.summary`, as `parent` does).
pub fn probe_epic_link(fields: &IssueFields, candidates: &[String]) -> Option<EpicLink> {
    candidates
        .iter()
        .find_map(|name| fields.field(name).and_then(epic_link_from_value))
}

fn epic_link_from_value(value: &Value) -> Option<EpicLink> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(EpicLink {
            key: s.trim().to_string(),
            title: None,
        }),
        Value::Object(map) => {
            let key = map.get("key").and_then(Value::as_str).filter(|k| !k.is_empty())?;
            let title = map
                .get("fields")
                .and_then(|f| f.get("summary"))
                .and_then(Value::as_str)
                .map(|s| s.to_string());
            Some(EpicLink {
                key: key.to_string(),
                title,
            })
        }
        _ => None,
    }
}

/// Render a pass-through user-ish field for display.
///
/// Objects use `displayName`, then `name`, then `value`; strings are used
/// verbatim; other JSON values are rendered as text. Absent or empty values
/// become `"Unassigned"`.
pub fn join_assignee(fields: &IssueFields, field_id: Option<&str>) -> String {
    field_id
        .and_then(|id| fields.field(id))
        .and_then(display_value)
        .unwrap_or_else(|| UNASSIGNED.to_string())
}

fn display_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Object(map) => ["displayName", "name", "value"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(|s| s.to_string())
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(custom: Value) -> IssueFields {
        serde_json::from_value(custom).unwrap()
    }

    fn candidates(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(coerce_story_points(Some(&json!(5))), Ok(5.0));
        assert_eq!(coerce_story_points(Some(&json!(2.5))), Ok(2.5));
        assert_eq!(coerce_story_points(Some(&json!(" 3 "))), Ok(3.0));
        assert_eq!(coerce_story_points(Some(&json!(""))), Ok(0.0));
        assert_eq!(coerce_story_points(Some(&Value::Null)), Ok(0.0));
        assert_eq!(coerce_story_points(None), Ok(0.0));
    }

    #[test]
    fn test_coerce_failures() {
        assert!(coerce_story_points(Some(&json!("abc"))).is_err());
        assert!(coerce_story_points(Some(&json!(-1))).is_err());
        assert!(coerce_story_points(Some(&json!("NaN"))).is_err());
        assert!(coerce_story_points(Some(&json!(true))).is_err());
        assert!(coerce_story_points(Some(&json!([1]))).is_err());
    }

    #[test]
    fn test_story_points_defaults_to_zero_on_failure() {
        let issue: Issue = serde_json::from_value(json!({
            "key": "ABC-1",
            "fields": {"customfield_10004": "abc"}
        }))
        .unwrap();
        assert_eq!(story_points(&issue, "customfield_10004"), 0.0);
        assert_eq!(story_points(&issue, "customfield_missing"), 0.0);
    }

    #[test]
    fn test_probe_first_non_empty_wins() {
        let f = fields(json!({
            "epic": null,
            "epicLink": "",
            "customfield_10902": "ABC-9",
            "customfield_10014": "ABC-10"
        }));
        let link = probe_epic_link(
            &f,
            &candidates(&["epic", "epicLink", "customfield_10902", "customfield_10014"]),
        )
        .unwrap();
        assert_eq!(link.key, "ABC-9");
        assert!(link.title.is_none());
    }

    #[test]
    fn test_probe_parent_object_carries_title() {
        let f = fields(json!({
            "parent": {"key": "ABC-100", "fields": {"summary": "Auth epic"}}
        }));
        let link = probe_epic_link(&f, &candidates(&["epic", "parent"])).unwrap();
        assert_eq!(link.key, "ABC-100");
        assert_eq!(link.title.as_deref(), Some("Auth epic"));
    }

    #[test]
    fn test_probe_nothing_found() {
        let f = fields(json!({"parent": {"id": "1"}, "epic": 12}));
        assert!(probe_epic_link(&f, &candidates(&["epic", "parent"])).is_none());
        assert!(probe_epic_link(&f, &[]).is_none());
    }

    #[test]
    fn test_join_assignee_forms() {
        let id = Some("customfield_17801");
        assert_eq!(
            join_assignee(&fields(json!({"customfield_17801": {"displayName": "Kai"}})), id),
            "Kai"
        );
        assert_eq!(
            join_assignee(&fields(json!({"customfield_17801": {"value": "Team Red"}})), id),
            "Team Red"
        );
        assert_eq!(
            join_assignee(&fields(json!({"customfield_17801": "Robin"})), id),
            "Robin"
        );
        assert_eq!(
            join_assignee(&fields(json!({"customfield_17801": 7})), id),
            "7"
        );
        assert_eq!(
            join_assignee(&fields(json!({"customfield_17801": ""})), id),
            UNASSIGNED
        );
        assert_eq!(join_assignee(&fields(json!({})), id), UNASSIGNED);
        assert_eq!(
            join_assignee(&fields(json!({"customfield_17801": "Robin"})), None),
            UNASSIGNED
        );
    }
}
