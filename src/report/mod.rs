pub mod chart;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

pub use chart::VelocitySeries;

pub const SPRINT_DATASET_FILE: &str = "sprint_data.csv";
pub const VELOCITY_CHART_FILE: &str = "velocity_cycle_time.svg";
pub const SPRINT_REPORT_FILE: &str = "sprint_report.json";
pub const EPIC_ROLLUP_FILE: &str = "epics.csv";

/// Write rows as CSV with a header taken from the first row's field names.
///
/// An empty slice produces an empty file with no header.
pub fn write_dataset_to_csv<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    if rows.is_empty() {
        log::warn!("No rows to write; created empty {}", path.display());
        return Ok(());
    }

    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write a value as pretty-printed JSON.
pub fn write_dataset_to_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.write_all(b"\n")?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Render the velocity chart for a dataset and write it as SVG.
pub fn write_velocity_chart(series: &VelocitySeries, path: &Path) -> Result<()> {
    std::fs::write(path, series.render_svg())?;
    log::info!("Wrote chart for {} sprints to {}", series.len(), path.display());
    Ok(())
}
