pub mod creep;
pub mod cycle_time;
pub mod epic;
pub mod fields;
pub mod insight;
pub mod sprint;
pub mod types;

use chrono::{DateTime, Utc};

use crate::date_util::parse_timestamp;
use crate::tracker::models::History;

pub use types::*;

/// Changelog entries with parsed timestamps, oldest first.
///
/// The sort is stable, so entries sharing a timestamp keep their input order.
/// Entries whose timestamp cannot be parsed are skipped.
pub(crate) fn chronological(histories: &[History]) -> Vec<(DateTime<Utc>, &History)> {
    let mut entries: Vec<(DateTime<Utc>, &History)> = histories
        .iter()
        .filter_map(|h| match parse_timestamp(&h.created) {
            Ok(ts) => Some((ts, h)),
            Err(e) => {
                log::warn!("Skipping changelog entry with bad timestamp: {e}");
                None
            }
        })
        .collect();
    entries.sort_by_key(|(ts, _)| *ts);
    entries
}
