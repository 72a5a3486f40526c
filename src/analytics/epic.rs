use super::types::{Category, EpicFailure, EpicRollupReport, EpicRollupRow};
use crate::error::Result;
use crate::tracker::jql;
use crate::tracker::models::Issue;
use crate::tracker::Tracker;
use crate::url::browse_url;

fn is_excluded(key: &str, exclusions: &[String]) -> bool {
    exclusions
        .iter()
        .any(|marker| !marker.is_empty() && key.contains(marker.as_str()))
}

/// Percentages of `total` in hundredths, rounded by largest remainder.
///
/// Each share is within 0.01 of its exact value and the shares never sum past
/// the rounded exact sum, so fully categorized buckets total exactly 100.
fn percentages<const N: usize>(counts: [u64; N], total: u64) -> [f64; N] {
    if total == 0 {
        return [0.0; N];
    }
    let scaled = counts.map(|c| c * 10_000);
    let mut shares = scaled.map(|n| n / total);
    let target = (2 * scaled.iter().sum::<u64>() + total) / (2 * total);
    let mut spare = target.saturating_sub(shares.iter().sum());

    let mut by_remainder: Vec<usize> = (0..N).collect();
    by_remainder.sort_by_key(|&i| std::cmp::Reverse(scaled[i] % total));
    for i in by_remainder {
        if spare == 0 {
            break;
        }
        if scaled[i] % total > 0 {
            shares[i] += 1;
            spare -= 1;
        }
    }
    shares.map(|hundredths| hundredths as f64 / 100.0)
}

/// Completion counts for one epic's children, after exclusions.
pub fn summarize_epic(
    epic_key: &str,
    title: Option<String>,
    link: String,
    children: &[Issue],
    exclusions: &[String],
) -> EpicRollupRow {
    let mut total = 0u64;
    let (mut completed, mut in_progress, mut todo) = (0u64, 0u64, 0u64);

    for child in children {
        if is_excluded(&child.key, exclusions) {
            log::debug!("Excluding {} from epic {epic_key}", child.key);
            continue;
        }
        total += 1;
        match child.fields.category_name().and_then(Category::from_name) {
            Some(Category::Done) => completed += 1,
            Some(Category::InProgress) => in_progress += 1,
            Some(Category::ToDo) => todo += 1,
            None => {}
        }
    }

    let [percentage_completed, percentage_inprogress, percentage_todo] =
        percentages([completed, in_progress, todo], total);

    EpicRollupRow {
        epic_key: epic_key.to_string(),
        title,
        link,
        total_issues: total,
        completed,
        in_progress,
        todo,
        percentage_completed,
        percentage_inprogress,
        percentage_todo,
    }
}

async fn rollup_one(tracker: &dyn Tracker, key: &str, exclusions: &[String]) -> Result<EpicRollupRow> {
    let epic = tracker.fetch_issue(key).await?;
    let children = tracker
        .search_issues(&jql::epic_children(key), false, None)
        .await?;
    log::info!("Epic {key}: {} children", children.len());
    Ok(summarize_epic(
        key,
        epic.fields.summary,
        browse_url(tracker.base_url(), key),
        &children,
        exclusions,
    ))
}

/// Roll up every epic independently. A failing epic is recorded in
/// `failures` and the batch continues.
pub async fn rollup_epics(
    tracker: &dyn Tracker,
    epic_keys: &[String],
    exclusions: &[String],
) -> EpicRollupReport {
    let mut report = EpicRollupReport::default();
    for key in epic_keys {
        match rollup_one(tracker, key, exclusions).await {
            Ok(row) => report.rows.push(row),
            Err(e) => {
                log::error!("Failed to roll up epic {key}: {e}");
                report.failures.push(EpicFailure {
                    epic_key: key.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    report
}
