use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::creep::{detect_creep, CreepCheck};
use super::fields::{join_assignee, probe_epic_link, story_points, UNASSIGNED};
use super::types::{
    Category, CreepIssue, InsightMetrics, IssueEntry, PointTotals, SprintInfo, SprintInsight,
    StageCounts,
};
use crate::config::ReportConfig;
use crate::date_util::{format_minute, parse_timestamp, whole_days_until};
use crate::tracker::models::{Issue, Sprint};
use crate::tracker::Tracker;

/// Split a sprint goal into a list. Semicolon-separated goals become several
/// entries; anything else is one entry.
pub fn sprint_goals(goal: Option<&str>) -> Vec<String> {
    let Some(goal) = goal.map(str::trim).filter(|g| !g.is_empty()) else {
        return Vec::new();
    };
    if goal.contains(';') {
        goal.split(';')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(|g| g.to_string())
            .collect()
    } else {
        vec![goal.to_string()]
    }
}

/// Whole days until the sprint ends; `0` when the end date is missing or unparsable.
pub fn remaining_days(end_date: Option<&str>, now: DateTime<Utc>) -> i64 {
    match end_date.map(parse_timestamp) {
        Some(Ok(end)) => whole_days_until(now, end),
        Some(Err(e)) => {
            log::debug!("Sprint end date unusable, remaining days is 0: {e}");
            0
        }
        None => 0,
    }
}

/// Epic keys referenced by the issues whose link does not embed a title.
pub fn epic_keys_needing_titles(issues: &[Issue], config: &ReportConfig) -> Vec<String> {
    let mut seen = HashSet::new();
    issues
        .iter()
        .filter_map(|i| probe_epic_link(&i.fields, &config.epic_link_fields))
        .filter(|link| link.title.is_none())
        .map(|link| link.key)
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Look up epic summaries. Lookups that fail are logged and left out.
pub async fn resolve_epic_titles(tracker: &dyn Tracker, keys: &[String]) -> HashMap<String, String> {
    let mut titles = HashMap::new();
    for key in keys {
        match tracker.fetch_issue(key).await {
            Ok(epic) => {
                if let Some(summary) = epic.fields.summary {
                    titles.insert(key.clone(), summary);
                }
            }
            Err(e) => log::warn!("Could not fetch epic {key}: {e}"),
        }
    }
    titles
}

/// Build the insight report for the active sprint.
///
/// `epic_titles` supplies summaries for epic links that do not carry one.
pub fn build_insights(
    sprint: &Sprint,
    issues: &[Issue],
    config: &ReportConfig,
    epic_titles: &HashMap<String, String>,
    base_url: Option<&str>,
    now: DateTime<Utc>,
) -> SprintInsight {
    let sprint_start = match sprint.start_date.as_deref().map(parse_timestamp) {
        Some(Ok(start)) => Some(start),
        Some(Err(e)) => {
            log::warn!("Sprint {} has an unusable start date, skipping creep: {e}", sprint.id);
            None
        }
        None => None,
    };

    let mut metrics = InsightMetrics {
        total_issues: issues.len(),
        ..Default::default()
    };
    let mut stages = StageCounts::default();
    let mut points = PointTotals::default();
    let mut issue_collection = Vec::with_capacity(issues.len());
    let mut creep_issues = Vec::new();

    for issue in issues {
        let fields = &issue.fields;
        let issue_points = story_points(issue, &config.story_points_field);

        let creep = sprint_start
            .map(|start| detect_creep(issue.histories(), sprint.id, start))
            .unwrap_or_default();

        let category = fields.category_name();
        if let Some(bucket) = category.and_then(Category::from_name) {
            stages.record(bucket);
        }

        points.total += issue_points;
        if category == Some("Done") {
            points.completed += issue_points;
        } else {
            points.remaining += issue_points;
        }

        if creep.is_creep {
            metrics.scope_creep_count += 1;
            metrics.creep_points += issue_points;
            creep_issues.push(creep_issue(issue, &creep, issue_points));
        }

        let epic = probe_epic_link(fields, &config.epic_link_fields);
        let epic_title = epic
            .as_ref()
            .and_then(|link| link.title.clone().or_else(|| epic_titles.get(&link.key).cloned()));

        issue_collection.push(IssueEntry {
            key: issue.key.clone(),
            title: fields.summary.clone(),
            assignee: fields
                .assignee
                .as_ref()
                .and_then(|u| u.label())
                .unwrap_or(UNASSIGNED)
                .to_string(),
            status: fields.status_name().map(|s| s.to_string()),
            category: category.map(|c| c.to_string()),
            points: issue_points,
            is_creep: creep.is_creep,
            epic_key: epic.map(|link| link.key),
            epic_title,
            join_assignee: join_assignee(fields, config.join_assignee_field.as_deref()),
            x_day: config
                .x_day_field
                .as_deref()
                .and_then(|id| fields.field(id))
                .cloned(),
        });
    }

    log::info!(
        "Sprint {}: {} issues, {} creep, {}/{} points done",
        sprint.name,
        metrics.total_issues,
        metrics.scope_creep_count,
        points.completed,
        points.total
    );

    SprintInsight {
        sprint_info: SprintInfo {
            name: sprint.name.clone(),
            start: sprint.start_date.clone(),
            end: sprint.end_date.clone(),
            goals: sprint_goals(sprint.goal.as_deref()),
            remaining_days: remaining_days(sprint.end_date.as_deref(), now),
            jira_base_url: base_url.map(|u| u.to_string()),
        },
        metrics,
        stages,
        points,
        issue_collection,
        creep_issues,
    }
}

fn creep_issue(issue: &Issue, creep: &CreepCheck, points: f64) -> CreepIssue {
    CreepIssue {
        key: issue.key.clone(),
        added_at: creep.added_at.map(format_minute),
        points,
    }
}
