use chrono::{DateTime, Utc};

use super::chronological;
use crate::tracker::models::History;

/// Outcome of scanning an issue's changelog for its addition to a sprint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreepCheck {
    pub is_creep: bool,
    /// When the issue was last added to the sprint, if ever.
    pub added_at: Option<DateTime<Utc>>,
}

/// Decide whether an issue joined the sprint after it started.
///
/// A sprint-field change whose new value mentions the sprint id counts as an
/// addition; the chronologically last addition wins. Joining at exactly the
/// start instant is not creep.
pub fn detect_creep(
    histories: &[History],
    sprint_id: u64,
    sprint_start: DateTime<Utc>,
) -> CreepCheck {
    let needle = sprint_id.to_string();
    let mut added_at = None;

    for (ts, history) in chronological(histories) {
        let added = history
            .items
            .iter()
            .any(|item| {
                item.field.eq_ignore_ascii_case("sprint") && item.to_text().contains(&needle)
            });
        if added {
            added_at = Some(ts);
        }
    }

    CreepCheck {
        is_creep: added_at.is_some_and(|at| at > sprint_start),
        added_at,
    }
}
