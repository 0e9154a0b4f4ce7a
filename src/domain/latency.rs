//! Latency percentiles and summaries.
//!
//! Two percentile rules are in use. Live snapshots interpolate linearly
//! between neighbouring samples; persisted history picks the nearest rank.
//! The two can disagree slightly on small sample sets.

use serde::Serialize;

/// Linearly interpolated percentile of a sorted slice, `q` in `0.0..=1.0`.
///
/// Returns `0.0` for an empty slice.
#[must_use]
pub fn interpolated_percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let k = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = k.floor() as usize;
    let hi = k.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (k - lo as f64)
}

/// Round to the nearest integer, ties to the even neighbour.
fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 && rounded % 2.0 != 0.0 {
        rounded - x.signum()
    } else {
        rounded
    }
}

/// Nearest-rank percentile of a sorted slice, `pct` in `0.0..=100.0`.
///
/// Picks `sorted[round(pct / 100 * (n - 1))]` with ties going to the even
/// rank, so the median of an even-sized set is the lower middle sample.
/// Returns `0.0` for an empty slice.
#[must_use]
pub fn nearest_rank_percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let index = round_half_even(rank) as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Sort latency samples ascending. NaN samples sort last.
#[must_use]
pub fn sorted_samples<'a>(samples: impl IntoIterator<Item = &'a f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = samples.into_iter().copied().collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Point-in-time summary of a latency ring, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
    /// Most recently recorded sample.
    pub latest: f64,
}

impl LatencySummary {
    /// Summarize samples given in recording order.
    pub fn from_samples<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a f64>,
        I::IntoIter: DoubleEndedIterator + Clone,
    {
        let iter = samples.into_iter();
        let Some(&latest) = iter.clone().next_back() else {
            return Self::default();
        };
        let sorted = sorted_samples(iter);
        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            avg: sum / count as f64,
            p50: interpolated_percentile(&sorted, 0.50),
            p95: interpolated_percentile(&sorted, 0.95),
            min: sorted[0],
            max: sorted[count - 1],
            latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn interpolated_between_neighbours() {
        let s = [1.0, 2.0, 3.0, 4.0];
        // k = 3 * 0.5 = 1.5 -> 2.0 + 0.5 * (3.0 - 2.0)
        assert_eq!(interpolated_percentile(&s, 0.5), 2.5);
        // k = 3 * 0.95 = 2.85 -> 3.0 + 0.85 * 1.0
        assert!((interpolated_percentile(&s, 0.95) - 3.85).abs() < 1e-9);
        assert_eq!(interpolated_percentile(&s, 0.0), 1.0);
        assert_eq!(interpolated_percentile(&s, 1.0), 4.0);
    }

    #[test]
    fn percentiles_of_empty_and_singleton() {
        assert_eq!(interpolated_percentile(&[], 0.5), 0.0);
        assert_eq!(nearest_rank_percentile(&[], 95.0), 0.0);
        assert_eq!(interpolated_percentile(&[10.0], 0.95), 10.0);
        assert_eq!(nearest_rank_percentile(&[10.0], 0.0), 10.0);
        assert_eq!(nearest_rank_percentile(&[10.0], 95.0), 10.0);
    }

    #[test]
    fn nearest_rank_even_length() {
        let s = [1.0, 2.0, 3.0, 4.0];
        // (q/100) * 3: 1.5 -> 2, 0.75 -> 1, 2.25 -> 2, 2.85 -> 3
        assert_eq!(nearest_rank_percentile(&s, 50.0), 3.0);
        assert_eq!(nearest_rank_percentile(&[10.0, 40.0], 50.0), 10.0);
        assert_eq!(nearest_rank_percentile(&s, 25.0), 2.0);
        assert_eq!(nearest_rank_percentile(&s, 75.0), 3.0);
        assert_eq!(nearest_rank_percentile(&s, 95.0), 4.0);
    }

    #[test]
    fn nearest_rank_ties_go_to_even_rank() {
        let s = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        // 2.5 -> 2
        assert_eq!(nearest_rank_percentile(&s, 50.0), 3.0);
        // 0.5 -> 0, 3.5 -> 4
        assert_eq!(nearest_rank_percentile(&s, 10.0), 1.0);
        assert_eq!(nearest_rank_percentile(&s, 70.0), 5.0);
        assert_eq!(round_half_even(4.5), 4.0);
        assert_eq!(round_half_even(5.5), 6.0);
        assert_eq!(round_half_even(2.4), 2.0);
        assert_eq!(round_half_even(2.6), 3.0);
    }

    #[test]
    fn nearest_rank_odd_length() {
        let s = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(nearest_rank_percentile(&s, 50.0), 3.0);
        assert_eq!(nearest_rank_percentile(&s, 5.0), 1.0);
        assert_eq!(nearest_rank_percentile(&s, 95.0), 5.0);
    }

    #[test]
    fn rules_disagree_on_small_samples() {
        let s = [10.0, 40.0];
        assert_eq!(interpolated_percentile(&s, 0.5), 25.0);
        assert_eq!(nearest_rank_percentile(&s, 50.0), 10.0);
    }

    #[test]
    fn summary_keeps_recording_order_for_latest() {
        let ring: VecDeque<f64> = VecDeque::from(vec![30.0, 10.0, 20.0]);
        let summary = LatencySummary::from_samples(&ring);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.latest, 20.0);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 30.0);
        assert_eq!(summary.avg, 20.0);
        assert_eq!(summary.p50, 20.0);
    }

    #[test]
    fn summary_of_nothing_is_zeroed() {
        let ring: VecDeque<f64> = VecDeque::new();
        assert_eq!(LatencySummary::from_samples(&ring), LatencySummary::default());
    }
}
