//! Single-pass summary statistics over a stream of observations.
//!
//! [`StatAccumulator`] keeps a running count, mean, min, max and sum of
//! squared deviations using Welford's online update, so the raw values are
//! never buffered and the variance does not suffer the cancellation error of
//! the naive sum / sum-of-squares formula.

use serde::{Serialize, Serializer};

// ── StatAccumulator ───────────────────────────────────────────────────────────

/// Running count / mean / min / max / variance for one numeric series.
///
/// Edge-case policy:
/// * [`mean`](Self::mean) is `0.0` for an empty accumulator.
/// * [`variance`](Self::variance) and
///   [`standard_deviation`](Self::standard_deviation) are `0.0` when fewer
///   than two observations exist. Sample variance of a single point is
///   undefined; reporting it as zero is a convention, not an error.
/// * [`min`](Self::min) and [`max`](Self::max) are `None` until the first
///   observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatAccumulator {
    count: u64,
    mean: f64,
    sum_sq: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl StatAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Incorporate one observation.
    pub fn add(&mut self, x: f64) {
        self.count += 1;

        if self.count == 1 {
            self.mean = x;
            self.sum_sq = 0.0;
            self.min = Some(x);
            self.max = Some(x);
            return;
        }

        let old_mean = self.mean;
        let new_mean = old_mean + (x - old_mean) / self.count as f64;
        self.sum_sq += (x - old_mean) * (x - new_mean);
        self.mean = new_mean;

        self.min = self.min.map(|m| m.min(x));
        self.max = self.max.map(|m| m.max(x));
    }

    /// Number of observations added so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean, or `0.0` when empty.
    pub fn mean(&self) -> f64 {
        if self.count > 0 {
            self.mean
        } else {
            0.0
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Sample variance (divisor `count - 1`), or `0.0` below two observations.
    pub fn variance(&self) -> f64 {
        if self.count > 1 {
            self.sum_sq / (self.count - 1) as f64
        } else {
            0.0
        }
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// `true` when no observation has been added.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Snapshot of every derived figure, in the shape written to reports.
    pub fn summary(&self) -> StatSummary {
        StatSummary {
            count: self.count(),
            mean: self.mean(),
            min: self.min(),
            max: self.max(),
            variance: self.variance(),
            standard_deviation: self.standard_deviation(),
        }
    }
}

impl Extend<f64> for StatAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl FromIterator<f64> for StatAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}

impl Serialize for StatAccumulator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.summary().serialize(serializer)
    }
}

// ── StatSummary ───────────────────────────────────────────────────────────────

/// Plain-data view of a [`StatAccumulator`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSummary {
    pub count: u64,
    pub mean: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub variance: f64,
    pub standard_deviation: f64,
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        let scale = a.abs().max(b.abs()).max(1.0);
        (a - b).abs() <= 1e-9 * scale
    }

    // ── empty / single observation ───────────────────────────────────────────

    #[test]
    fn test_empty_accumulator() {
        let acc = StatAccumulator::new();
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.mean(), 0.0);
        assert_eq!(acc.variance(), 0.0);
        assert_eq!(acc.standard_deviation(), 0.0);
        assert!(acc.min().is_none());
        assert!(acc.max().is_none());
        assert!(acc.is_empty());
    }

    #[test]
    fn test_single_observation() {
        let mut acc = StatAccumulator::new();
        acc.add(3.25);
        assert_eq!(acc.count(), 1);
        assert_eq!(acc.mean(), 3.25);
        assert_eq!(acc.min(), Some(3.25));
        assert_eq!(acc.max(), Some(3.25));
        assert_eq!(acc.variance(), 0.0);
        assert_eq!(acc.standard_deviation(), 0.0);
    }

    // ── multiple observations ────────────────────────────────────────────────

    #[test]
    fn test_known_series() {
        // Sample variance of 2,4,4,4,5,5,7,9 is 32/7.
        let acc: StatAccumulator = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .into_iter()
            .collect();
        assert_eq!(acc.count(), 8);
        assert!(approx_eq(acc.mean(), 5.0));
        assert!(approx_eq(acc.variance(), 32.0 / 7.0));
        assert!(approx_eq(acc.standard_deviation(), (32.0_f64 / 7.0).sqrt()));
        assert_eq!(acc.min(), Some(2.0));
        assert_eq!(acc.max(), Some(9.0));
    }

    #[test]
    fn test_matches_direct_computation() {
        let values = [0.5, 13.25, 2.0, 7.75, 100.0, 0.0, 42.125, 3.5];
        let acc: StatAccumulator = values.iter().copied().collect();

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

        assert_eq!(acc.count(), values.len() as u64);
        assert!(approx_eq(acc.mean(), mean), "mean = {}", acc.mean());
        assert!(approx_eq(acc.variance(), var), "variance = {}", acc.variance());
        assert_eq!(acc.min(), Some(0.0));
        assert_eq!(acc.max(), Some(100.0));
    }

    #[test]
    fn test_order_independence() {
        let a: StatAccumulator = [1.5, 8.0, 4.25].into_iter().collect();
        let b: StatAccumulator = [4.25, 1.5, 8.0].into_iter().collect();
        assert!(approx_eq(a.mean(), b.mean()));
        assert!(approx_eq(a.variance(), b.variance()));
        assert_eq!(a.min(), b.min());
        assert_eq!(a.max(), b.max());
    }

    #[test]
    fn test_large_offset_is_stable() {
        // Naive sum-of-squares loses all precision here.
        let base = 1.0e9;
        let acc: StatAccumulator = [base + 4.0, base + 7.0, base + 13.0, base + 16.0]
            .into_iter()
            .collect();
        assert!((acc.variance() - 30.0).abs() < 1e-6, "variance = {}", acc.variance());
    }

    #[test]
    fn test_negative_values_tracked_in_min() {
        let acc: StatAccumulator = [3.0, -2.0, 1.0].into_iter().collect();
        assert_eq!(acc.min(), Some(-2.0));
        assert_eq!(acc.max(), Some(3.0));
    }

    // ── serialisation ────────────────────────────────────────────────────────

    #[test]
    fn test_serializes_as_summary() {
        let acc: StatAccumulator = [1.0, 3.0].into_iter().collect();
        let value = serde_json::to_value(&acc).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["mean"], 2.0);
        assert_eq!(value["min"], 1.0);
        assert_eq!(value["max"], 3.0);
        assert_eq!(value["variance"], 2.0);
    }

    #[test]
    fn test_empty_serializes_null_extrema() {
        let value = serde_json::to_value(StatAccumulator::new()).unwrap();
        assert_eq!(value["count"], 0);
        assert!(value["min"].is_null());
        assert!(value["max"].is_null());
    }
}
