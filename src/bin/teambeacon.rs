use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use teambeacon::report::{self, VelocitySeries};
use teambeacon::{
    Config, EpicRollupReport, ProjectRecord, SprintDatasetRow, SprintInsight, SprintRecord,
    TeamBeacon,
};

#[derive(Parser)]
#[command(name = "teambeacon", about = "Sprint and epic telemetry from Jira")]
struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory report files are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the closed-sprint dataset and velocity chart
    Sprints {
        /// Board id (overrides JIRA_BOARD_ID)
        #[arg(long)]
        board: Option<u64>,
        /// Number of most recent closed sprints
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the insight report for the active sprint
    Insights {
        /// Board id (overrides JIRA_BOARD_ID)
        #[arg(long)]
        board: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Roll up child-issue progress for epics
    Epics {
        /// Epic keys or browse URLs
        #[arg(required = true)]
        epics: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one issue
    Issue {
        /// Issue key or URL
        key: String,
    },
    /// List visible projects
    Projects,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let beacon = TeamBeacon::from_config(Config::from_env()?)?;

    match cli.command {
        Commands::Sprints { board, limit, json } => {
            handle_sprints(&beacon, &cli.out_dir, board, limit, json).await?;
        }
        Commands::Insights { board, json } => {
            handle_insights(&beacon, &cli.out_dir, board, json).await?;
        }
        Commands::Epics { epics, json } => {
            handle_epics(&beacon, &cli.out_dir, &epics, json).await?;
        }
        Commands::Issue { key } => {
            let record = beacon.issue_record(&key).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Projects => {
            let projects = beacon.projects().await?;
            print_projects(&projects);
        }
    }

    Ok(())
}

async fn handle_sprints(
    beacon: &TeamBeacon,
    out_dir: &Path,
    board: Option<u64>,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let board_id = beacon.board(board)?;
    let sprints = beacon.closed_sprints(board_id, Some(limit)).await?;
    eprintln!("Processing {} closed sprints on board {board_id}...", sprints.len());

    let rows = beacon.sprint_dataset(&sprints).await;
    std::fs::create_dir_all(out_dir)?;
    report::write_dataset_to_csv(&rows, &out_dir.join(report::SPRINT_DATASET_FILE))?;
    report::write_velocity_chart(
        &VelocitySeries::from_dataset(&rows),
        &out_dir.join(report::VELOCITY_CHART_FILE),
    )?;

    if json {
        let records: Vec<SprintRecord> = sprints.iter().map(SprintRecord::from).collect();
        let output = serde_json::json!({ "sprints": records, "dataset": rows });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_sprint_rows(&rows);
    }
    Ok(())
}

async fn handle_insights(
    beacon: &TeamBeacon,
    out_dir: &Path,
    board: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let board_id = beacon.board(board)?;
    let Some(insight) = beacon.sprint_insights(board_id, chrono::Utc::now()).await? else {
        eprintln!("No active sprint on board {board_id}.");
        return Ok(());
    };

    std::fs::create_dir_all(out_dir)?;
    report::write_dataset_to_json(&insight, &out_dir.join(report::SPRINT_REPORT_FILE))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&insight)?);
    } else {
        print_insight(&insight);
    }
    Ok(())
}

async fn handle_epics(
    beacon: &TeamBeacon,
    out_dir: &Path,
    epics: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let rollup = beacon.epic_rollup(epics).await;

    std::fs::create_dir_all(out_dir)?;
    report::write_dataset_to_csv(&rollup.rows, &out_dir.join(report::EPIC_ROLLUP_FILE))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rollup)?);
    } else {
        print_epics(&rollup);
    }
    if !rollup.failures.is_empty() && rollup.rows.is_empty() {
        anyhow::bail!("no epic could be rolled up");
    }
    Ok(())
}

fn print_sprint_rows(rows: &[SprintDatasetRow]) {
    if rows.is_empty() {
        println!("No sprint data.");
        return;
    }
    println!("{:<30} {:>8} {:>12}  Dates", "Sprint", "Points", "Cycle (d)");
    for row in rows {
        let cycle = match row.average_cycle_time.days() {
            Some(d) => format!("{d:.1}"),
            None => "N/A".to_string(),
        };
        println!(
            "{:<30} {:>8} {:>12}  {} .. {}",
            truncate(&row.name, 30),
            row.completed_story_points,
            cycle,
            row.start_date,
            row.end_date
        );
    }
}

fn print_insight(insight: &SprintInsight) {
    let info = &insight.sprint_info;
    println!("Sprint: {}", info.name);
    println!(
        "  Dates:     {} .. {}",
        info.start.as_deref().unwrap_or("?"),
        info.end.as_deref().unwrap_or("?")
    );
    println!("  Remaining: {} days", info.remaining_days);
    for goal in &info.goals {
        println!("  Goal:      {goal}");
    }
    println!("  Issues:");
    println!("    Total:       {}", insight.metrics.total_issues);
    println!("    To Do:       {}", insight.stages.to_do);
    println!("    In Progress: {}", insight.stages.in_progress);
    println!("    Done:        {}", insight.stages.done);
    println!("  Points:");
    println!("    Total:     {}", insight.points.total);
    println!("    Completed: {}", insight.points.completed);
    println!("    Remaining: {}", insight.points.remaining);
    println!(
        "  Scope creep: {} issues, {} points",
        insight.metrics.scope_creep_count, insight.metrics.creep_points
    );
    for creep in &insight.creep_issues {
        println!(
            "    {:<14} added {}  ({} pts)",
            creep.key,
            creep.added_at.as_deref().unwrap_or("?"),
            creep.points
        );
    }
}

fn print_epics(rollup: &EpicRollupReport) {
    for row in &rollup.rows {
        println!("{}: {}", row.epic_key, row.title.as_deref().unwrap_or("(untitled)"));
        println!("  Link:        {}", row.link);
        println!("  Issues:      {}", row.total_issues);
        println!("  Done:        {} ({:.2}%)", row.completed, row.percentage_completed);
        println!("  In Progress: {} ({:.2}%)", row.in_progress, row.percentage_inprogress);
        println!("  To Do:       {} ({:.2}%)", row.todo, row.percentage_todo);
    }
    for failure in &rollup.failures {
        eprintln!("Failed: {}: {}", failure.epic_key, failure.message);
    }
}

fn print_projects(projects: &[ProjectRecord]) {
    if projects.is_empty() {
        println!("No projects visible.");
        return;
    }
    for p in projects {
        match &p.lead {
            Some(lead) => println!("{:<12} {}  (lead: {lead})", p.key, p.name),
            None => println!("{:<12} {}", p.key, p.name),
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
