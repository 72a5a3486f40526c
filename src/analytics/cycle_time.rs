use chrono::{DateTime, Utc};

use super::chronological;
use crate::date_util::days_between;
use crate::tracker::models::Issue;

/// Statuses that mark the start of active work.
pub const IN_PROGRESS_STATUSES: &[&str] = &["Analysis", "Kickoff", "In Progress"];

/// Statuses that mark completion.
pub const DONE_STATUSES: &[&str] = &["Closed", "Release Ready"];

/// Days from the first transition into an in-progress status to the last
/// transition into a done status.
///
/// Returns `None` when either boundary is missing. A done transition that
/// precedes the start clamps to `0.0`.
pub fn compute_cycle_time(issue: &Issue) -> Option<f64> {
    let mut start: Option<DateTime<Utc>> = None;
    let mut end: Option<DateTime<Utc>> = None;

    for (ts, history) in chronological(issue.histories()) {
        for item in history.items.iter().filter(|i| i.field == "status") {
            let Some(to) = item.to_label.as_deref() else {
                continue;
            };
            if start.is_none() && IN_PROGRESS_STATUSES.contains(&to) {
                start = Some(ts);
            }
            if DONE_STATUSES.contains(&to) {
                end = Some(ts);
            }
        }
    }

    let days = days_between(start?, end?);
    Some(days.max(0.0))
}
