use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static RE_ISSUE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*-[0-9]+$").unwrap());

/// Check if a string looks like a Jira issue key (`ABC-123`).
pub fn is_issue_key(s: &str) -> bool {
    RE_ISSUE_KEY.is_match(s)
}

/// Parse a Jira URL that points at an issue and return the issue key.
///
/// Supported URL patterns:
/// - `https://jira.example.com/browse/ABC-12`
/// - `https://jira.example.com/projects/ABC/issues/ABC-12`
/// - any board/search URL carrying `?selectedIssue=ABC-12`
pub fn parse_issue_url(input: &str) -> Result<String> {
    let url = url::Url::parse(input).map_err(|e| Error::UrlParse(e.to_string()))?;

    if let Some((_, key)) = url.query_pairs().find(|(k, _)| k == "selectedIssue") {
        if is_issue_key(&key) {
            return Ok(key.into_owned());
        }
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    // The key follows a `browse` or `issues` segment; context paths before it are allowed.
    segments
        .windows(2)
        .find(|w| matches!(w[0], "browse" | "issues") && is_issue_key(w[1]))
        .map(|w| w[1].to_string())
        .ok_or_else(|| Error::UrlParse(format!("no issue key in URL: {input}")))
}

/// Extract an issue key from either a raw key or a Jira URL.
/// Raw keys are upper-cased before validation.
pub fn resolve_issue_key(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let upper = trimmed.to_uppercase();
    if is_issue_key(&upper) {
        return Ok(upper);
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return parse_issue_url(trimmed);
    }
    Err(Error::InvalidIssueKey(input.to_string()))
}

/// Browse link for an issue under the tracker's base URL.
pub fn browse_url(base_url: &str, key: &str) -> String {
    format!("{}/browse/{key}", base_url.trim_end_matches('/'))
}
