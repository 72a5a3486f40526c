use std::fmt::Write;

use crate::analytics::SprintDatasetRow;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 70.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 110.0;
const TICKS: usize = 5;

const BAR_COLOR: &str = "#4c78a8";
const LINE_COLOR: &str = "#f58518";

#[derive(Debug, Clone, PartialEq)]
struct SprintPoint {
    label: String,
    story_points: f64,
    /// Sprints without an average cycle time plot as `0.0`.
    cycle_time: f64,
}

/// Completed points and average cycle time per sprint, oldest sprint first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VelocitySeries {
    points: Vec<SprintPoint>,
}

impl VelocitySeries {
    /// Build from dataset rows ordered newest first.
    pub fn from_dataset(rows: &[SprintDatasetRow]) -> Self {
        let points = rows
            .iter()
            .rev()
            .map(|row| SprintPoint {
                label: row.name.clone(),
                story_points: row.completed_story_points,
                cycle_time: row.average_cycle_time.days().unwrap_or(0.0),
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn story_points(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.story_points).collect()
    }

    pub fn cycle_times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cycle_time).collect()
    }

    /// Bar chart of story points (left axis) with cycle time as a line (right axis).
    pub fn render_svg(&self) -> String {
        let mut svg = String::new();
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let bottom = MARGIN_TOP + plot_h;
        let right = MARGIN_LEFT + plot_w;

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="28" text-anchor="middle" font-size="16">Velocity and Cycle Time per Sprint</text>"#,
            WIDTH / 2.0
        );

        let points_max = nice_max(self.points.iter().map(|p| p.story_points));
        let cycle_max = nice_max(self.points.iter().map(|p| p.cycle_time));

        // Axes and gridlines
        let _ = writeln!(
            svg,
            r##"<line x1="{MARGIN_LEFT}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="#333"/>"##
        );
        for i in 0..=TICKS {
            let frac = i as f64 / TICKS as f64;
            let y = bottom - frac * plot_h;
            let _ = writeln!(
                svg,
                r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="#e0e0e0"/>"##
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{:.1}" text-anchor="end" fill="{BAR_COLOR}">{}</text>"#,
                MARGIN_LEFT - 8.0,
                y + 4.0,
                format_tick(points_max * frac)
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{:.1}" fill="{LINE_COLOR}">{}</text>"#,
                right + 8.0,
                y + 4.0,
                format_tick(cycle_max * frac)
            );
        }
        let _ = writeln!(
            svg,
            r#"<text transform="translate(20,{:.1}) rotate(-90)" text-anchor="middle" fill="{BAR_COLOR}">Story Points</text>"#,
            MARGIN_TOP + plot_h / 2.0
        );
        let _ = writeln!(
            svg,
            r#"<text transform="translate({:.1},{:.1}) rotate(90)" text-anchor="middle" fill="{LINE_COLOR}">Average Cycle Time (days)</text>"#,
            WIDTH - 20.0,
            MARGIN_TOP + plot_h / 2.0
        );

        if self.is_empty() {
            let _ = writeln!(
                svg,
                r##"<text x="{}" y="{:.1}" text-anchor="middle" fill="#888">No sprint data</text>"##,
                WIDTH / 2.0,
                MARGIN_TOP + plot_h / 2.0
            );
            svg.push_str("</svg>\n");
            return svg;
        }

        let slot = plot_w / self.len() as f64;
        let bar_w = slot * 0.6;
        let mut line_points = Vec::with_capacity(self.len());

        for (i, point) in self.points.iter().enumerate() {
            let center = MARGIN_LEFT + slot * (i as f64 + 0.5);
            let label = escape_xml(&point.label);

            let bar_h = point.story_points / points_max * plot_h;
            let _ = writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{bar_w:.1}" height="{bar_h:.1}" fill="{BAR_COLOR}"><title>{}: {} points</title></rect>"#,
                center - bar_w / 2.0,
                bottom - bar_h,
                label,
                format_tick(point.story_points)
            );

            let y = bottom - point.cycle_time / cycle_max * plot_h;
            line_points.push(format!("{center:.1},{y:.1}"));
            let _ = writeln!(
                svg,
                r#"<circle cx="{center:.1}" cy="{y:.1}" r="4" fill="{LINE_COLOR}"><title>{}: {:.2} days</title></circle>"#,
                label,
                point.cycle_time
            );

            let _ = writeln!(
                svg,
                r#"<text transform="translate({center:.1},{:.1}) rotate(-45)" text-anchor="end">{}</text>"#,
                bottom + 14.0,
                label
            );
        }

        let _ = writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{LINE_COLOR}" stroke-width="2"/>"#,
            line_points.join(" ")
        );
        svg.push_str("</svg>\n");
        svg
    }
}

/// Axis maximum: the largest value rounded up, never below 1.
fn nice_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0_f64, f64::max).ceil().max(1.0)
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
