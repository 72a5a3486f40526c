use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::tracker::models::{Issue, Project, Sprint};

/// Status-category buckets used for stage counts and epic progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    ToDo,
    InProgress,
    Done,
}

impl Category {
    /// Map a tracker status-category name; unknown names map to `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "To Do" => Some(Category::ToDo),
            "In Progress" => Some(Category::InProgress),
            "Done" => Some(Category::Done),
            _ => None,
        }
    }
}

/// Mean cycle time of a sprint, or "N/A" when no issue had one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AverageCycleTime {
    Days(f64),
    NotAvailable,
}

impl AverageCycleTime {
    pub fn days(&self) -> Option<f64> {
        match self {
            AverageCycleTime::Days(d) => Some(*d),
            AverageCycleTime::NotAvailable => None,
        }
    }
}

impl fmt::Display for AverageCycleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AverageCycleTime::Days(d) => write!(f, "{d}"),
            AverageCycleTime::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for AverageCycleTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AverageCycleTime::Days(d) => serializer.serialize_f64(*d),
            AverageCycleTime::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

/// One row of the closed-sprint dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SprintDatasetRow {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub completed_date: String,
    pub completed_story_points: f64,
    pub average_cycle_time: AverageCycleTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintInfo {
    pub name: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub goals: Vec<String>,
    pub remaining_days: i64,
    pub jira_base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightMetrics {
    pub total_issues: usize,
    pub scope_creep_count: usize,
    pub creep_points: f64,
}

/// Issue counts per status category. Issues in unmapped categories are not counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    #[serde(rename = "To Do")]
    pub to_do: u64,
    #[serde(rename = "In Progress")]
    pub in_progress: u64,
    #[serde(rename = "Done")]
    pub done: u64,
}

impl StageCounts {
    pub fn record(&mut self, category: Category) {
        match category {
            Category::ToDo => self.to_do += 1,
            Category::InProgress => self.in_progress += 1,
            Category::Done => self.done += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.to_do + self.in_progress + self.done
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointTotals {
    pub total: f64,
    pub completed: f64,
    pub remaining: f64,
}

/// Per-issue record of the active-sprint insight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueEntry {
    pub key: String,
    pub title: Option<String>,
    pub assignee: String,
    pub status: Option<String>,
    pub category: Option<String>,
    pub points: f64,
    pub is_creep: bool,
    pub epic_key: Option<String>,
    pub epic_title: Option<String>,
    pub join_assignee: String,
    pub x_day: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreepIssue {
    pub key: String,
    /// Minute precision, e.g. `2024-01-05 00:00`.
    pub added_at: Option<String>,
    pub points: f64,
}

/// Insight report for the active sprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintInsight {
    pub sprint_info: SprintInfo,
    pub metrics: InsightMetrics,
    pub stages: StageCounts,
    pub points: PointTotals,
    pub issue_collection: Vec<IssueEntry>,
    pub creep_issues: Vec<CreepIssue>,
}

/// Progress of one epic's children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpicRollupRow {
    pub epic_key: String,
    pub title: Option<String>,
    pub link: String,
    pub total_issues: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub todo: u64,
    pub percentage_completed: f64,
    pub percentage_inprogress: f64,
    pub percentage_todo: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpicFailure {
    pub epic_key: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpicRollupReport {
    pub rows: Vec<EpicRollupRow>,
    pub failures: Vec<EpicFailure>,
}

/// Flattened sprint metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintRecord {
    pub id: u64,
    pub name: String,
    pub state: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub complete_date: Option<String>,
}

impl From<&Sprint> for SprintRecord {
    fn from(s: &Sprint) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            state: s.state.as_str().to_string(),
            start_date: s.start_date.clone(),
            end_date: s.end_date.clone(),
            complete_date: s.complete_date.clone(),
        }
    }
}

/// Flattened issue snapshot; story points are passed through uncoerced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRecord {
    pub key: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub resolution: Option<String>,
    pub story_points: Option<Value>,
}

impl IssueRecord {
    pub fn from_issue(issue: &Issue, story_points_field: &str) -> Self {
        let f = &issue.fields;
        Self {
            key: issue.key.clone(),
            summary: f.summary.clone(),
            status: f.status_name().map(|s| s.to_string()),
            assignee: f.assignee.as_ref().and_then(|u| u.label()).map(|s| s.to_string()),
            reporter: f.reporter.as_ref().and_then(|u| u.label()).map(|s| s.to_string()),
            created: f.created.clone(),
            updated: f.updated.clone(),
            resolution: f.resolution.as_ref().map(|r| r.name.clone()),
            story_points: f.field(story_points_field).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub lead: Option<String>,
    pub url: Option<String>,
}

impl From<&Project> for ProjectRecord {
    fn from(p: &Project) -> Self {
        Self {
            key: p.key.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            lead: p.lead.as_ref().and_then(|u| u.label()).map(|s| s.to_string()),
            url: p.url.clone(),
        }
    }
}
