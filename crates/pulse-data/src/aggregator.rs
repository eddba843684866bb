//! Monthly activity aggregation over issue and pull-request records.
//!
//! Runs in two passes. The classification pass attributes each record to the
//! month it was created in and, for closed records, the month it was closed
//! in, while counting the live open totals. The carry-forward pass then walks
//! the buckets from the most recent month backwards, reconstructing how many
//! items were open at the end of each month from the live totals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use pulse_core::error::{PulseError, Result};
use pulse_core::models::{IssueRecord, ItemKind, MonthBucket, MonthKey};
use pulse_core::time_utils::{cycle_time_days, month_key};

// ── OpenTotals ────────────────────────────────────────────────────────────────

/// Number of items open at report time, regardless of the lookback window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpenTotals {
    pub issues: u64,
    pub pulls: u64,
}

impl OpenTotals {
    fn increment(&mut self, kind: ItemKind) {
        match kind {
            ItemKind::Issue => self.issues += 1,
            ItemKind::PullRequest => self.pulls += 1,
        }
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Result of [`AggregationEngine::aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    /// Live open totals.
    pub open: OpenTotals,
    /// One bucket per month with activity, ascending by month.
    pub buckets: Vec<MonthBucket>,
}

// ── AggregationEngine ─────────────────────────────────────────────────────────

/// Classifies records into [`MonthBucket`]s for a fixed reporting window.
///
/// Pure and synchronous: the engine does no I/O and holds no state between
/// calls, so aggregating the same inputs twice yields the same output.
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine {
    since: DateTime<Utc>,
    now: DateTime<Utc>,
}

impl AggregationEngine {
    /// `since` is the start of the lookback window; activity before it only
    /// counts toward the live open totals.
    pub fn new(since: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self { since, now }
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Aggregate the currently-open and the closed records into monthly
    /// buckets with carry-forward counts filled in.
    ///
    /// Fails on the first record that breaks the collection contract: an
    /// open record with a closure timestamp, a closed record without one, or
    /// a closed record closed before it was created.
    pub fn aggregate(
        &self,
        open_items: &[IssueRecord],
        closed_items: &[IssueRecord],
    ) -> Result<Aggregation> {
        debug!(
            "Analysing issues between {} and {}",
            self.since.to_rfc3339(),
            self.now.to_rfc3339()
        );

        let (open, buckets) = self.classify(open_items, closed_items)?;

        debug!(
            open_issues = open.issues,
            open_pulls = open.pulls,
            months = buckets.len(),
            "classification complete"
        );

        Ok(Aggregation {
            open,
            buckets: carry_forward(buckets, open),
        })
    }

    // ── Classification pass ───────────────────────────────────────────────

    fn classify(
        &self,
        open_items: &[IssueRecord],
        closed_items: &[IssueRecord],
    ) -> Result<(OpenTotals, BTreeMap<MonthKey, MonthBucket>)> {
        let mut open = OpenTotals::default();
        let mut buckets: BTreeMap<MonthKey, MonthBucket> = BTreeMap::new();

        for record in open_items {
            if record.closed_at.is_some() {
                return Err(PulseError::OpenRecordClosed {
                    id: record.id.clone(),
                });
            }

            let kind = record.kind();
            open.increment(kind);

            if record.created_at >= self.since {
                bucket_for(&mut buckets, month_key(record.created_at)).record_new(kind);
            }
        }

        for record in closed_items {
            let closed_at =
                record
                    .closed_at
                    .ok_or_else(|| PulseError::ClosedRecordMissingClosedAt {
                        id: record.id.clone(),
                    })?;
            if closed_at < record.created_at {
                return Err(PulseError::ClosedBeforeCreated {
                    id: record.id.clone(),
                });
            }

            let kind = record.kind();

            if record.created_at >= self.since {
                bucket_for(&mut buckets, month_key(record.created_at)).record_new(kind);
            }

            if closed_at >= self.since {
                let days = cycle_time_days(record.created_at, closed_at);
                bucket_for(&mut buckets, month_key(closed_at)).record_closed(kind, days);
            }
        }

        Ok((open, buckets))
    }
}

/// The bucket for `month`, created on first touch.
fn bucket_for(buckets: &mut BTreeMap<MonthKey, MonthBucket>, month: MonthKey) -> &mut MonthBucket {
    buckets
        .entry(month)
        .or_insert_with(|| MonthBucket::new(month))
}

// ── Carry-forward pass ────────────────────────────────────────────────────────

/// Fill in open snapshots and carried counts, returning buckets in ascending
/// month order.
///
/// The most recent bucket carries the live open total. Each older bucket
/// carries the newer bucket's count plus the items the newer month closed,
/// minus the items it created.
pub fn carry_forward(
    mut buckets: BTreeMap<MonthKey, MonthBucket>,
    open: OpenTotals,
) -> Vec<MonthBucket> {
    let mut carried_issues = open.issues as i64;
    let mut carried_pulls = open.pulls as i64;

    for bucket in buckets.values_mut().rev() {
        bucket.open_issues = open.issues;
        bucket.open_pulls = open.pulls;

        bucket.carried_issues = carried_issues;
        bucket.carried_pulls = carried_pulls;

        carried_issues += bucket.reverse_delta(ItemKind::Issue);
        carried_pulls += bucket.reverse_delta(ItemKind::PullRequest);
    }

    buckets.into_values().collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
