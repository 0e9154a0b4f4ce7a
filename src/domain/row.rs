//! Rows appended to durable storage on each persistence tick.

use super::latency::{nearest_rank_percentile, sorted_samples};
use super::snapshot::MetricsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityRow {
    pub ts: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotEquityRow {
    pub ts: f64,
    pub bot: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyEquityRow {
    pub ts: f64,
    pub strategy: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyRow {
    pub ts: f64,
    pub p50: f64,
    pub p95: f64,
}

/// Everything one tick writes. Append-only, never upserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotRows {
    pub equity: Option<EquityRow>,
    pub equity_bot: Vec<BotEquityRow>,
    pub equity_strategy: Vec<StrategyEquityRow>,
    pub latency: Option<LatencyRow>,
}

impl SnapshotRows {
    /// Build the rows for one tick: the last point of every curve, plus a
    /// nearest-rank latency row stamped `now` when samples exist.
    #[must_use]
    pub fn from_snapshot(snapshot: &MetricsSnapshot, now: f64) -> Self {
        let equity = snapshot.equity_curve.last().map(|p| EquityRow {
            ts: p.ts,
            value: p.value,
        });

        let mut equity_bot: Vec<BotEquityRow> = snapshot
            .equity_curve_per_bot
            .iter()
            .filter_map(|(bot, curve)| {
                curve.last().map(|p| BotEquityRow {
                    ts: p.ts,
                    bot: bot.clone(),
                    value: p.value,
                })
            })
            .collect();
        equity_bot.sort_by(|a, b| a.bot.cmp(&b.bot));

        let mut equity_strategy: Vec<StrategyEquityRow> = snapshot
            .equity_curve_per_strategy
            .iter()
            .filter_map(|(strategy, curve)| {
                curve.last().map(|p| StrategyEquityRow {
                    ts: p.ts,
                    strategy: strategy.clone(),
                    value: p.value,
                })
            })
            .collect();
        equity_strategy.sort_by(|a, b| a.strategy.cmp(&b.strategy));

        let latency = (!snapshot.http_latency_ms.is_empty()).then(|| {
            let sorted = sorted_samples(&snapshot.http_latency_ms);
            LatencyRow {
                ts: now,
                p50: nearest_rank_percentile(&sorted, 50.0),
                p95: nearest_rank_percentile(&sorted, 95.0),
            }
        });

        Self {
            equity,
            equity_bot,
            equity_strategy,
            latency,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        usize::from(self.equity.is_some())
            + self.equity_bot.len()
            + self.equity_strategy.len()
            + usize::from(self.latency.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::EquityPoint;

    fn point(ts: f64, value: f64) -> EquityPoint {
        EquityPoint { ts, value }
    }

    #[test]
    fn empty_snapshot_yields_no_rows() {
        let rows = SnapshotRows::from_snapshot(&MetricsSnapshot::default(), 1.0);
        assert_eq!(rows, SnapshotRows::default());
        assert_eq!(rows.row_count(), 0);
    }

    #[test]
    fn takes_last_point_of_each_curve() {
        let mut snap = MetricsSnapshot::default();
        snap.equity_curve = vec![point(1.0, 100.0), point(2.0, 101.0)];
        snap.equity_curve_per_bot
            .insert("bot-1".into(), vec![point(1.0, 50.0), point(3.0, 55.0)]);
        snap.equity_curve_per_bot.insert("bot-empty".into(), vec![]);
        snap.equity_curve_per_strategy
            .insert("grid".into(), vec![point(4.0, 70.0)]);

        let rows = SnapshotRows::from_snapshot(&snap, 9.0);

        assert_eq!(rows.equity, Some(EquityRow { ts: 2.0, value: 101.0 }));
        assert_eq!(
            rows.equity_bot,
            vec![BotEquityRow {
                ts: 3.0,
                bot: "bot-1".into(),
                value: 55.0
            }]
        );
        assert_eq!(rows.equity_strategy.len(), 1);
        assert_eq!(rows.latency, None);
        assert_eq!(rows.row_count(), 3);
    }

    #[test]
    fn latency_row_uses_nearest_rank() {
        let mut snap = MetricsSnapshot::default();
        snap.http_latency_ms = vec![4.0, 1.0, 3.0, 2.0];

        let rows = SnapshotRows::from_snapshot(&snap, 42.0);

        assert_eq!(
            rows.latency,
            Some(LatencyRow {
                ts: 42.0,
                p50: 3.0,
                p95: 4.0
            })
        );
    }
}
