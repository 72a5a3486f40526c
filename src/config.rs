use crate::error::{Error, Result};

pub const DEFAULT_STORY_POINTS_FIELD: &str = "customfield_10004";
pub const DEFAULT_JOIN_ASSIGNEE_FIELD: &str = "customfield_17801";
pub const DEFAULT_EPIC_LINK_FIELDS: &[&str] = &[
    "epic",
    "epicLink",
    "customfield_10902",
    "customfield_10014",
    "parent",
];

/// Connection settings for the Jira client.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub base_url: String,
    pub token: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

/// Field identifiers and filters used by the analytics.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub board_id: Option<u64>,
    pub story_points_field: String,
    /// Children whose key contains any of these markers are left out of epic rollups.
    pub epic_exclusions: Vec<String>,
    /// Tried in order; the first present, non-empty value is the epic link.
    pub epic_link_fields: Vec<String>,
    pub join_assignee_field: Option<String>,
    pub x_day_field: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            board_id: None,
            story_points_field: DEFAULT_STORY_POINTS_FIELD.to_string(),
            epic_exclusions: Vec::new(),
            epic_link_fields: DEFAULT_EPIC_LINK_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            join_assignee_field: Some(DEFAULT_JOIN_ASSIGNEE_FIELD.to_string()),
            x_day_field: None,
        }
    }
}

impl ReportConfig {
    /// The board id, or a configuration error naming the variable to set.
    pub fn require_board(&self) -> Result<u64> {
        self.board_id.ok_or_else(|| {
            Error::Config("no board configured. Set JIRA_BOARD_ID or pass --board".into())
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = get("JIRA_BASE_URL")
            .ok_or_else(|| Error::Config("JIRA_BASE_URL is not set".into()))?;
        let token =
            get("JIRA_PAT").ok_or_else(|| Error::Config("JIRA_PAT is not set".into()))?;

        let board_id = match get("JIRA_BOARD_ID") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                Error::Config(format!("JIRA_BOARD_ID must be an integer, got '{raw}'"))
            })?),
            None => None,
        };

        let max_retries = parse_or("JIRA_MAX_RETRIES", get("JIRA_MAX_RETRIES"), 3)?;
        let timeout_secs = parse_or("JIRA_TIMEOUT_SECS", get("JIRA_TIMEOUT_SECS"), 30)?;

        let defaults = ReportConfig::default();
        let report = ReportConfig {
            board_id,
            story_points_field: get("JIRA_STORY_POINTS_FIELD")
                .unwrap_or(defaults.story_points_field),
            epic_exclusions: get("JIRA_EPIC_EXCLUDE")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            epic_link_fields: get("JIRA_EPIC_LINK_FIELDS")
                .map(|v| split_list(&v))
                .filter(|fields| !fields.is_empty())
                .unwrap_or(defaults.epic_link_fields),
            join_assignee_field: get("JIRA_JOIN_ASSIGNEE_FIELD").or(defaults.join_assignee_field),
            x_day_field: get("JIRA_X_DAY_FIELD"),
        };

        Ok(Self {
            tracker: TrackerConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                token,
                max_retries,
                timeout_secs,
            },
            report,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(v) => v
            .parse()
            .map_err(|_| Error::Config(format!("{key} must be a number, got '{v}'"))),
        None => Ok(default),
    }
}

/// Split a comma-separated list, dropping blank entries.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("JIRA_BASE_URL", "https://jira.example.com/"),
            ("JIRA_PAT", "token"),
        ]))
        .unwrap();
        assert_eq!(cfg.tracker.base_url, "https://jira.example.com");
        assert_eq!(cfg.tracker.max_retries, 3);
        assert_eq!(cfg.tracker.timeout_secs, 30);
        assert_eq!(cfg.report.board_id, None);
        assert_eq!(cfg.report.story_points_field, "customfield_10004");
        assert!(cfg.report.epic_exclusions.is_empty());
        assert_eq!(cfg.report.epic_link_fields[0], "epic");
        assert_eq!(
            cfg.report.join_assignee_field.as_deref(),
            Some("customfield_17801")
        );
        assert!(cfg.report.x_day_field.is_none());
    }

    #[test]
    fn test_missing_credentials() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("JIRA_PAT", "token")])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("JIRA_BASE_URL", "https://x"), ("JIRA_PAT", "  ")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_board_id_must_be_integer() {
        let err = Config::from_lookup(lookup(&[
            ("JIRA_BASE_URL", "https://x"),
            ("JIRA_PAT", "t"),
            ("JIRA_BOARD_ID", "abc"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JIRA_BOARD_ID"));
    }

    #[test]
    fn test_full_config() {
        let cfg = Config::from_lookup(lookup(&[
            ("JIRA_BASE_URL", "https://x"),
            ("JIRA_PAT", "t"),
            ("JIRA_BOARD_ID", "123"),
            ("JIRA_STORY_POINTS_FIELD", "customfield_1"),
            ("JIRA_EPIC_EXCLUDE", "ACXRM, ,OPS"),
            ("JIRA_EPIC_LINK_FIELDS", "parent,customfield_2"),
            ("JIRA_X_DAY_FIELD", "customfield_3"),
            ("JIRA_MAX_RETRIES", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.report.require_board().unwrap(), 123);
        assert_eq!(cfg.report.story_points_field, "customfield_1");
        assert_eq!(cfg.report.epic_exclusions, vec!["ACXRM", "OPS"]);
        assert_eq!(cfg.report.epic_link_fields, vec!["parent", "customfield_2"]);
        assert_eq!(cfg.report.x_day_field.as_deref(), Some("customfield_3"));
        assert_eq!(cfg.tracker.max_retries, 0);
    }

    #[test]
    fn test_require_board_without_board() {
        assert!(ReportConfig::default().require_board().is_err());
    }
}
