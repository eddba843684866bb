use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PulseError;
use crate::stats::StatAccumulator;

// ── ItemKind ──────────────────────────────────────────────────────────────────

/// Whether a tracked item is a plain issue or a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Issue => f.write_str("issue"),
            ItemKind::PullRequest => f.write_str("pull request"),
        }
    }
}

// ── IssueRecord ───────────────────────────────────────────────────────────────

/// One issue or pull request as fetched from the tracker.
///
/// Whether the item is open or closed is not stored here; it is implied by
/// the collection the record was delivered in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Opaque identifier, only used to name the record in errors.
    pub id: String,
    /// `true` when the payload carried a pull-request link.
    pub is_pull_request: bool,
    /// When the item was opened (UTC).
    pub created_at: DateTime<Utc>,
    /// When the item was closed (UTC), if it is closed.
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

impl IssueRecord {
    /// Build a record for an item that is still open.
    pub fn open(id: impl Into<String>, is_pull_request: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            is_pull_request,
            created_at,
            closed_at: None,
        }
    }

    /// Build a record for an item that has been closed.
    pub fn closed(
        id: impl Into<String>,
        is_pull_request: bool,
        created_at: DateTime<Utc>,
        closed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            is_pull_request,
            created_at,
            closed_at: Some(closed_at),
        }
    }

    pub fn kind(&self) -> ItemKind {
        if self.is_pull_request {
            ItemKind::PullRequest
        } else {
            ItemKind::Issue
        }
    }
}

// ── MonthKey ──────────────────────────────────────────────────────────────────

/// A calendar month, ordered chronologically and rendered as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    /// `month` is 1-based (January = 1).
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PulseError::TimestampParse(format!("invalid month key: {s}"));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self::new(year, month))
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── MonthBucket ───────────────────────────────────────────────────────────────

/// Activity attributed to one calendar month of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    /// The month this bucket covers.
    pub month: MonthKey,
    /// Issues created during the month (within the lookback window).
    pub new_issues: u64,
    /// Pull requests created during the month (within the lookback window).
    pub new_pulls: u64,
    /// Live count of open issues at report time; identical in every bucket.
    pub open_issues: u64,
    /// Live count of open pull requests at report time; identical in every bucket.
    pub open_pulls: u64,
    /// Issues still open at the end of the month.
    pub carried_issues: i64,
    /// Pull requests still open at the end of the month.
    pub carried_pulls: i64,
    /// Cycle time (days) of issues closed during the month.
    pub closed_issue_cycle_times: StatAccumulator,
    /// Cycle time (days) of pull requests closed during the month.
    pub closed_pull_cycle_times: StatAccumulator,
}

impl MonthBucket {
    pub fn new(month: MonthKey) -> Self {
        Self {
            month,
            new_issues: 0,
            new_pulls: 0,
            open_issues: 0,
            open_pulls: 0,
            carried_issues: 0,
            carried_pulls: 0,
            closed_issue_cycle_times: StatAccumulator::new(),
            closed_pull_cycle_times: StatAccumulator::new(),
        }
    }

    /// Count one item of `kind` created in this month.
    pub fn record_new(&mut self, kind: ItemKind) {
        match kind {
            ItemKind::Issue => self.new_issues += 1,
            ItemKind::PullRequest => self.new_pulls += 1,
        }
    }

    /// Record the cycle time of one item of `kind` closed in this month.
    pub fn record_closed(&mut self, kind: ItemKind, cycle_time_days: f64) {
        match kind {
            ItemKind::Issue => self.closed_issue_cycle_times.add(cycle_time_days),
            ItemKind::PullRequest => self.closed_pull_cycle_times.add(cycle_time_days),
        }
    }

    pub fn new_count(&self, kind: ItemKind) -> u64 {
        match kind {
            ItemKind::Issue => self.new_issues,
            ItemKind::PullRequest => self.new_pulls,
        }
    }

    pub fn closed_cycle_times(&self, kind: ItemKind) -> &StatAccumulator {
        match kind {
            ItemKind::Issue => &self.closed_issue_cycle_times,
            ItemKind::PullRequest => &self.closed_pull_cycle_times,
        }
    }

    pub fn carried(&self, kind: ItemKind) -> i64 {
        match kind {
            ItemKind::Issue => self.carried_issues,
            ItemKind::PullRequest => self.carried_pulls,
        }
    }

    /// Net change this month contributed to the open total: closures minus
    /// creations. Adding it to a month's carried count yields the carried
    /// count of the month before.
    pub fn reverse_delta(&self, kind: ItemKind) -> i64 {
        self.closed_cycle_times(kind).count() as i64 - self.new_count(kind) as i64
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
