//! Markdown rendering of an [`ActivityReport`].
//!
//! One table per item kind with a row per month, oldest first.

use std::fmt::Write as _;

use pulse_core::formatting::{format_count, format_days};
use pulse_core::models::{ItemKind, MonthBucket};
use pulse_core::stats::StatAccumulator;
use pulse_data::analysis::ActivityReport;

const HEADER: [&str; 8] = [
    "Month", "New", "Closed", "Carried", "Mean", "Min", "Max", "Std dev",
];

/// Data for a single row of a monthly table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowData {
    /// `YYYY-MM`.
    pub period: String,
    pub new: String,
    pub closed: String,
    pub carried: String,
    pub mean: String,
    pub min: String,
    pub max: String,
    pub std_dev: String,
}

impl TableRowData {
    pub fn from_bucket(bucket: &MonthBucket, kind: ItemKind) -> Self {
        let times = bucket.closed_cycle_times(kind);
        Self {
            period: bucket.month.to_string(),
            new: format_count(bucket.new_count(kind) as i64),
            closed: format_count(times.count() as i64),
            carried: format_count(bucket.carried(kind)),
            mean: format_days(defined(times, StatAccumulator::mean)),
            min: format_days(times.min()),
            max: format_days(times.max()),
            std_dev: format_days(defined(times, StatAccumulator::standard_deviation)),
        }
    }

    fn cells(&self) -> [&str; 8] {
        [
            self.period.as_str(),
            self.new.as_str(),
            self.closed.as_str(),
            self.carried.as_str(),
            self.mean.as_str(),
            self.min.as_str(),
            self.max.as_str(),
            self.std_dev.as_str(),
        ]
    }
}

/// Render the full report.
pub fn render_markdown(report: &ActivityReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Activity report for {}", report.repository);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Window: {} to {} ({} months)",
        report.since.format("%Y-%m-%d"),
        report.now.format("%Y-%m-%d"),
        report.months
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Open issues: {}, open pull requests: {}",
        format_count(report.open_issues as i64),
        format_count(report.open_pulls as i64)
    );

    for (title, kind) in [("Issues", ItemKind::Issue), ("Pull requests", ItemKind::PullRequest)] {
        let _ = writeln!(out);
        let _ = writeln!(out, "## {title}");
        let _ = writeln!(out);
        out.push_str(&render_table(&report.buckets, kind));
    }

    out
}

/// Render the monthly table for one item kind.
pub fn render_table(buckets: &[MonthBucket], kind: ItemKind) -> String {
    if buckets.is_empty() {
        return "_No activity in this window._\n".to_string();
    }

    let mut out = String::new();
    push_row(&mut out, &HEADER);
    out.push_str("|---|---:|---:|---:|---:|---:|---:|---:|\n");
    for bucket in buckets {
        push_row(&mut out, &TableRowData::from_bucket(bucket, kind).cells());
    }
    out
}

fn push_row(out: &mut String, cells: &[&str]) {
    out.push_str("| ");
    out.push_str(&cells.join(" | "));
    out.push_str(" |\n");
}

/// `None` for an empty series so the cell renders as `-`.
fn defined(times: &StatAccumulator, f: fn(&StatAccumulator) -> f64) -> Option<f64> {
    if times.is_empty() {
        None
    } else {
        Some(f(times))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
