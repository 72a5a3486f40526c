pub mod analytics;
pub mod config;
pub mod date_util;
pub mod error;
pub mod report;
pub mod tracker;
pub mod url;

pub use analytics::{
    AverageCycleTime, EpicFailure, EpicRollupReport, EpicRollupRow, IssueRecord, ProjectRecord,
    SprintDatasetRow, SprintInsight, SprintRecord,
};
pub use config::{Config, ReportConfig, TrackerConfig};
pub use error::{Error, Result};
pub use report::VelocitySeries;
pub use tracker::{JiraClient, Tracker};

use chrono::{DateTime, Utc};

use analytics::{epic, insight, sprint};
use tracker::jql;
use tracker::models::Sprint;

/// Main entry point: pulls board data from the tracker and turns it into reports.
pub struct TeamBeacon {
    tracker: Box<dyn Tracker>,
    config: ReportConfig,
}

impl TeamBeacon {
    pub fn new(tracker: Box<dyn Tracker>, config: ReportConfig) -> Self {
        Self { tracker, config }
    }

    /// Build a beacon backed by a Jira client.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = JiraClient::new(config.tracker)?;
        Ok(Self::new(Box::new(client), config.report))
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// The board to report on: an explicit override, else the configured one.
    pub fn board(&self, board_override: Option<u64>) -> Result<u64> {
        match board_override {
            Some(id) => Ok(id),
            None => self.config.require_board(),
        }
    }

    // ── Sprint dataset ─────────────────────────────────────────────

    /// Closed sprints of a board, newest first, at most `limit` of them.
    pub async fn closed_sprints(&self, board_id: u64, limit: Option<usize>) -> Result<Vec<Sprint>> {
        let mut sprints = self.tracker.fetch_closed_sprints(board_id).await?;
        if let Some(limit) = limit {
            sprints.truncate(limit);
        }
        Ok(sprints)
    }

    /// One dataset row per sprint. Sprints whose issues cannot be fetched
    /// are logged and left out.
    pub async fn sprint_dataset(&self, sprints: &[Sprint]) -> Vec<SprintDatasetRow> {
        let mut rows = Vec::with_capacity(sprints.len());
        for s in sprints {
            let issues = match self
                .tracker
                .search_issues(&jql::sprint_done_issues(s.id), true, None)
                .await
            {
                Ok(issues) => issues,
                Err(e) => {
                    log::error!("Failed to fetch issues for sprint {} ({}): {e}", s.id, s.name);
                    continue;
                }
            };
            rows.push(sprint::aggregate_sprint(s, &issues, &self.config.story_points_field));
        }
        rows
    }

    // ── Active sprint insight ──────────────────────────────────────

    /// Insight report for the board's first active sprint, or `None` when
    /// no sprint is active.
    pub async fn sprint_insights(
        &self,
        board_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<SprintInsight>> {
        let active = self.tracker.fetch_active_sprints(board_id).await?;
        let Some(sprint) = active.first() else {
            log::warn!("No active sprint on board {board_id}");
            return Ok(None);
        };
        if active.len() > 1 {
            log::info!(
                "Board {board_id} has {} active sprints; reporting on {}",
                active.len(),
                sprint.name
            );
        }

        let issues = self
            .tracker
            .search_issues(&jql::sprint_issues(sprint.id), true, None)
            .await?;

        let epic_keys = insight::epic_keys_needing_titles(&issues, &self.config);
        let epic_titles = insight::resolve_epic_titles(self.tracker.as_ref(), &epic_keys).await;

        Ok(Some(insight::build_insights(
            sprint,
            &issues,
            &self.config,
            &epic_titles,
            Some(self.tracker.base_url()),
            now,
        )))
    }

    // ── Epics ──────────────────────────────────────────────────────

    /// Roll up epics given as keys or browse URLs. Inputs that do not
    /// resolve to a key are reported as failures.
    pub async fn epic_rollup(&self, inputs: &[String]) -> EpicRollupReport {
        let mut keys = Vec::with_capacity(inputs.len());
        let mut invalid = Vec::new();
        for input in inputs {
            match url::resolve_issue_key(input) {
                Ok(key) => keys.push(key),
                Err(e) => invalid.push(EpicFailure {
                    epic_key: input.clone(),
                    message: e.to_string(),
                }),
            }
        }

        let mut report =
            epic::rollup_epics(self.tracker.as_ref(), &keys, &self.config.epic_exclusions).await;
        invalid.append(&mut report.failures);
        report.failures = invalid;
        report
    }

    // ── Lookups ────────────────────────────────────────────────────

    /// Fetch one issue by key or URL as a flat record.
    pub async fn issue_record(&self, input: &str) -> Result<IssueRecord> {
        let key = url::resolve_issue_key(input)?;
        let issue = self.tracker.fetch_issue(&key).await?;
        Ok(IssueRecord::from_issue(&issue, &self.config.story_points_field))
    }

    pub async fn projects(&self) -> Result<Vec<ProjectRecord>> {
        let projects = self.tracker.fetch_projects().await?;
        Ok(projects.iter().map(ProjectRecord::from).collect())
    }
}
