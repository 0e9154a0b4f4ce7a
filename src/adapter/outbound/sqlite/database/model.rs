//! Insertable rows for the metrics history tables.

use diesel::prelude::*;

use super::schema::{equity, equity_bot, equity_strategy, latency};
use crate::domain::{BotEquityRow, EquityRow, LatencyRow, StrategyEquityRow};

#[derive(Insertable, Debug, Clone, Copy)]
#[diesel(table_name = equity)]
pub struct NewEquityRow {
    pub ts: f64,
    pub value: f64,
}

impl From<&EquityRow> for NewEquityRow {
    fn from(row: &EquityRow) -> Self {
        Self {
            ts: row.ts,
            value: row.value,
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = equity_bot)]
pub struct NewBotEquityRow<'a> {
    pub ts: f64,
    pub bot: &'a str,
    pub value: f64,
}

impl<'a> From<&'a BotEquityRow> for NewBotEquityRow<'a> {
    fn from(row: &'a BotEquityRow) -> Self {
        Self {
            ts: row.ts,
            bot: &row.bot,
            value: row.value,
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = equity_strategy)]
pub struct NewStrategyEquityRow<'a> {
    pub ts: f64,
    pub strategy: &'a str,
    pub value: f64,
}

impl<'a> From<&'a StrategyEquityRow> for NewStrategyEquityRow<'a> {
    fn from(row: &'a StrategyEquityRow) -> Self {
        Self {
            ts: row.ts,
            strategy: &row.strategy,
            value: row.value,
        }
    }
}

#[derive(Insertable, Debug, Clone, Copy)]
#[diesel(table_name = latency)]
pub struct NewLatencyRow {
    pub ts: f64,
    pub p50: f64,
    pub p95: f64,
}

impl From<&LatencyRow> for NewLatencyRow {
    fn from(row: &LatencyRow) -> Self {
        Self {
            ts: row.ts,
            p50: row.p50,
            p95: row.p95,
        }
    }
}
