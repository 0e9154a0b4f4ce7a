//! Diesel table definitions for the metrics history.
//!
//! The tables have no declared key; `rowid` stands in for diesel.

diesel::table! {
    equity (rowid) {
        rowid -> BigInt,
        ts -> Double,
        value -> Double,
    }
}

diesel::table! {
    equity_bot (rowid) {
        rowid -> BigInt,
        ts -> Double,
        bot -> Text,
        value -> Double,
    }
}

diesel::table! {
    equity_strategy (rowid) {
        rowid -> BigInt,
        ts -> Double,
        strategy -> Text,
        value -> Double,
    }
}

diesel::table! {
    latency (rowid) {
        rowid -> BigInt,
        ts -> Double,
        p50 -> Double,
        p95 -> Double,
    }
}

diesel::allow_tables_to_appear_in_same_query!(equity, equity_bot, equity_strategy, latency);

/// Idempotent DDL run before every write.
pub const CREATE_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS equity (ts REAL, value REAL);
CREATE INDEX IF NOT EXISTS ix_equity_ts ON equity(ts);
CREATE TABLE IF NOT EXISTS equity_bot (ts REAL, bot TEXT, value REAL);
CREATE INDEX IF NOT EXISTS ix_equity_bot ON equity_bot(bot, ts);
CREATE TABLE IF NOT EXISTS equity_strategy (ts REAL, strategy TEXT, value REAL);
CREATE INDEX IF NOT EXISTS ix_equity_strategy ON equity_strategy(strategy, ts);
CREATE TABLE IF NOT EXISTS latency (ts REAL, p50 REAL, p95 REAL);
CREATE INDEX IF NOT EXISTS ix_latency_ts ON latency(ts);
";
