use super::cycle_time::compute_cycle_time;
use super::fields::story_points;
use super::types::{AverageCycleTime, SprintDatasetRow};
use crate::tracker::models::{Issue, Sprint};

const NOT_AVAILABLE: &str = "N/A";

/// Fold a closed sprint's completed issues into one dataset row.
pub fn aggregate_sprint(
    sprint: &Sprint,
    completed_issues: &[Issue],
    story_points_field: &str,
) -> SprintDatasetRow {
    let completed_story_points: f64 = completed_issues
        .iter()
        .map(|i| story_points(i, story_points_field))
        .sum();

    let cycle_times: Vec<f64> = completed_issues
        .iter()
        .filter_map(compute_cycle_time)
        .collect();
    let average_cycle_time = if cycle_times.is_empty() {
        AverageCycleTime::NotAvailable
    } else {
        AverageCycleTime::Days(cycle_times.iter().sum::<f64>() / cycle_times.len() as f64)
    };

    log::debug!(
        "Sprint {} ({}): {} done issues, {} points, {} with cycle time",
        sprint.id,
        sprint.name,
        completed_issues.len(),
        completed_story_points,
        cycle_times.len()
    );

    SprintDatasetRow {
        name: or_na(Some(sprint.name.as_str())),
        start_date: or_na(sprint.start_date.as_deref()),
        end_date: or_na(sprint.end_date.as_deref()),
        completed_date: or_na(sprint.complete_date.as_deref()),
        completed_story_points,
        average_cycle_time,
    }
}

fn or_na(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{issue, status_change};
    use crate::tracker::models::SprintState;
    use serde_json::json;

    const SP: &str = "customfield_10004";

    fn sprint() -> Sprint {
        Sprint {
            id: 7,
            name: "Sprint 7".into(),
            state: SprintState::Closed,
            start_date: Some("2024-01-01T00:00:00.000Z".into()),
            end_date: Some("2024-01-14T00:00:00.000Z".into()),
            complete_date: None,
            goal: None,
        }
    }

    #[test]
    fn test_bad_points_and_no_cycle_times() {
        let issues = vec![
            issue("ABC-1", json!({SP: 5}), vec![]),
            issue("ABC-2", json!({SP: "abc"}), vec![]),
        ];
        let row = aggregate_sprint(&sprint(), &issues, SP);
        assert_eq!(row.completed_story_points, 5.0);
        assert_eq!(row.average_cycle_time, AverageCycleTime::NotAvailable);
        assert_eq!(row.completed_date, "N/A");
        assert_eq!(row.start_date, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_empty_sprint() {
        let row = aggregate_sprint(&sprint(), &[], SP);
        assert_eq!(row.name, "Sprint 7");
        assert_eq!(row.completed_story_points, 0.0);
        assert_eq!(row.average_cycle_time, AverageCycleTime::NotAvailable);
    }

    #[test]
    fn test_blank_name_is_na() {
        let unnamed = Sprint {
            name: String::new(),
            ..sprint()
        };
        let row = aggregate_sprint(&unnamed, &[], SP);
        assert_eq!(row.name, "N/A");
    }

    #[test]
    fn test_average_over_issues_with_cycle_time() {
        let issues = vec![
            issue(
                "ABC-1",
                json!({SP: "3"}),
                vec![
                    status_change("2024-01-02T00:00:00Z", "In Progress"),
                    status_change("2024-01-04T00:00:00Z", "Closed"),
                ],
            ),
            issue(
                "ABC-2",
                json!({SP: 2}),
                vec![
                    status_change("2024-01-02T00:00:00Z", "Kickoff"),
                    status_change("2024-01-06T00:00:00Z", "Release Ready"),
                ],
            ),
            issue("ABC-3", json!({}), vec![]),
        ];
        let row = aggregate_sprint(&sprint(), &issues, SP);
        assert_eq!(row.completed_story_points, 5.0);
        assert_eq!(row.average_cycle_time, AverageCycleTime::Days(3.0));
    }
}
