/// JQL for the completed issues of a sprint.
///
/// Generates: `sprint = 42 AND statusCategory = Done`
pub fn sprint_done_issues(sprint_id: u64) -> String {
    format!("sprint = {sprint_id} AND statusCategory = Done")
}

/// JQL for every issue in a sprint.
pub fn sprint_issues(sprint_id: u64) -> String {
    format!("sprint = {sprint_id}")
}

/// JQL for the children of an epic, through either the `parent` link or the
/// legacy `Epic Link` field.
///
/// Generates: `parent = ABC-1 OR "Epic Link" = ABC-1`
pub fn epic_children(epic_key: &str) -> String {
    let key = escape_jql_value(epic_key);
    format!("parent = {key} OR \"Epic Link\" = {key}")
}

/// Escape a JQL value. Issue keys (letters, digits, `_`, `-`) pass through;
/// anything else is quoted.
fn escape_jql_value(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprint_queries() {
        assert_eq!(sprint_done_issues(42), "sprint = 42 AND statusCategory = Done");
        assert_eq!(sprint_issues(7), "sprint = 7");
    }

    #[test]
    fn test_epic_children_query() {
        assert_eq!(
            epic_children("ABC-1"),
            "parent = ABC-1 OR \"Epic Link\" = ABC-1"
        );
    }

    #[test]
    fn test_plain_key_not_quoted() {
        assert_eq!(escape_jql_value("ABC-12"), "ABC-12");
    }

    #[test]
    fn test_special_chars_are_quoted() {
        assert_eq!(escape_jql_value("a b"), "\"a b\"");
        assert_eq!(escape_jql_value("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(escape_jql_value(""), "\"\"");
    }
}
