pub mod client;
pub mod jql;
pub mod models;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::date_util::parse_timestamp;
use crate::error::Result;
use models::{Issue, Project, Sprint};

pub use client::JiraClient;

/// The issue-tracker operations the reports are built from.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Base URL used for browse links in reports.
    fn base_url(&self) -> &str;

    /// Every closed sprint of a board, de-duplicated and newest first.
    async fn fetch_closed_sprints(&self, board_id: u64) -> Result<Vec<Sprint>>;

    /// Active sprints of a board, in tracker order.
    async fn fetch_active_sprints(&self, board_id: u64) -> Result<Vec<Sprint>>;

    /// Run a JQL search. `max_results = None` fetches every match.
    async fn search_issues(
        &self,
        jql: &str,
        expand_changelog: bool,
        max_results: Option<u32>,
    ) -> Result<Vec<Issue>>;

    /// Fetch one issue by key. A missing issue is `Error::NotFound`.
    async fn fetch_issue(&self, key: &str) -> Result<Issue>;

    async fn fetch_projects(&self) -> Result<Vec<Project>>;
}

/// De-duplicate sprints by id (first occurrence wins) and sort by start date,
/// newest first. Sprints without a parsable start date go last.
pub fn order_closed_sprints(sprints: Vec<Sprint>) -> Vec<Sprint> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Sprint> = sprints
        .into_iter()
        .filter(|s| seen.insert(s.id))
        .collect();
    unique.sort_by_cached_key(|s| {
        std::cmp::Reverse(s.start_date.as_deref().and_then(|d| parse_timestamp(d).ok()))
    });
    unique
}

/// In-memory tracker for driver and rollup tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::models::{Issue, Project, Sprint};
    use super::Tracker;
    use crate::error::{Error, Result};

    #[derive(Default)]
    pub struct FakeTracker {
        pub closed: Vec<Sprint>,
        pub active: Vec<Sprint>,
        /// Search results keyed by exact JQL. Unknown queries fail.
        pub searches: HashMap<String, Vec<Issue>>,
        pub issues: HashMap<String, Issue>,
        pub projects: Vec<Project>,
    }

    #[async_trait]
    impl Tracker for FakeTracker {
        fn base_url(&self) -> &str {
            "https://jira.example.com"
        }

        async fn fetch_closed_sprints(&self, _board_id: u64) -> Result<Vec<Sprint>> {
            Ok(super::order_closed_sprints(self.closed.clone()))
        }

        async fn fetch_active_sprints(&self, _board_id: u64) -> Result<Vec<Sprint>> {
            Ok(self.active.clone())
        }

        async fn search_issues(
            &self,
            jql: &str,
            _expand_changelog: bool,
            max_results: Option<u32>,
        ) -> Result<Vec<Issue>> {
            let mut found = self.searches.get(jql).cloned().ok_or_else(|| Error::Api {
                status: 400,
                body: format!("unexpected JQL: {jql}"),
            })?;
            if let Some(max) = max_results {
                found.truncate(max as usize);
            }
            Ok(found)
        }

        async fn fetch_issue(&self, key: &str) -> Result<Issue> {
            self.issues
                .get(key)
                .cloned()
                .ok_or_else(|| Error::NotFound(key.to_string()))
        }

        async fn fetch_projects(&self) -> Result<Vec<Project>> {
            Ok(self.projects.clone())
        }
    }
}
