//! Report pipeline for GitHub Pulse.
//!
//! Narrows raw payloads to records, runs the [`AggregationEngine`], and wraps
//! the buckets in an [`ActivityReport`] ready for rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use pulse_core::error::Result;
use pulse_core::models::{IssueRecord, MonthBucket};
use pulse_core::time_utils::lookback_since;

use crate::aggregator::AggregationEngine;
use crate::reader::RawCollections;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Number of open records processed.
    pub open_records: usize,
    /// Number of closed records processed.
    pub closed_records: usize,
    /// Wall-clock seconds spent aggregating.
    pub aggregation_seconds: f64,
}

/// Everything a renderer needs to produce the monthly activity report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityReport {
    /// `owner/repo`.
    pub repository: String,
    /// Start of the lookback window.
    pub since: DateTime<Utc>,
    /// Report time.
    pub now: DateTime<Utc>,
    /// Length of the lookback window in months.
    pub months: u32,
    /// Live count of open issues.
    pub open_issues: u64,
    /// Live count of open pull requests.
    pub open_pulls: u64,
    /// Monthly buckets, ascending by month.
    pub buckets: Vec<MonthBucket>,
    pub metadata: ReportMetadata,
}

/// Identifies the repository and window a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWindow {
    pub owner: String,
    pub repo: String,
    pub months: u32,
    pub now: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        months: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            months,
            now,
        }
    }

    /// `owner/repo`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Start of the lookback window.
    pub fn since(&self) -> Result<DateTime<Utc>> {
        lookback_since(self.now, self.months)
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the pipeline over raw tracker payloads.
pub fn analyze_raw(window: &ReportWindow, raw: &RawCollections) -> Result<ActivityReport> {
    let (open, closed) = raw.to_records()?;
    analyze_records(window, &open, &closed)
}

/// Run the pipeline over already-narrowed records.
///
/// 1. Resolve the window start from `window.now` and `window.months`.
/// 2. Aggregate the records into monthly buckets.
/// 3. Return an [`ActivityReport`].
pub fn analyze_records(
    window: &ReportWindow,
    open: &[IssueRecord],
    closed: &[IssueRecord],
) -> Result<ActivityReport> {
    let since = window.since()?;
    let engine = AggregationEngine::new(since, window.now);

    let start = std::time::Instant::now();
    let aggregation = engine.aggregate(open, closed)?;
    let aggregation_seconds = start.elapsed().as_secs_f64();

    info!(
        "{}: {} months with activity, {} open issues, {} open pull requests",
        window.slug(),
        aggregation.buckets.len(),
        aggregation.open.issues,
        aggregation.open.pulls
    );

    Ok(ActivityReport {
        repository: window.slug(),
        since,
        now: window.now,
        months: window.months,
        open_issues: aggregation.open.issues,
        open_pulls: aggregation.open.pulls,
        buckets: aggregation.buckets,
        metadata: ReportMetadata {
            generated_at: Utc::now().to_rfc3339(),
            open_records: open.len(),
            closed_records: closed.len(),
            aggregation_seconds,
        },
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
