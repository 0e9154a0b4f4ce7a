//! Builders for trade fills and event payloads.

use serde_json::{json, Value};

use crate::domain::{Fill, Side};

/// A fill without bot or strategy attribution.
pub fn fill(exchange: &str, symbol: &str, side: Side, price: f64, qty: f64) -> Fill {
    Fill {
        exchange: exchange.to_string(),
        symbol: symbol.to_string(),
        side,
        price,
        qty,
        bot_id: None,
        strategy: None,
    }
}

/// Payload shape published with `ORDER_FILLED` / `TradeFilled` / `OrderExecuted`.
pub fn fill_payload(exchange: &str, symbol: &str, side: &str, price: f64, qty: f64) -> Value {
    json!({
        "exchange": exchange,
        "symbol": symbol,
        "side": side,
        "price": price,
        "qty": qty,
    })
}

/// Payload for `MarketDataUpdate` carrying a last price.
pub fn tick_payload(symbol: &str, price: f64) -> Value {
    json!({ "symbol": symbol, "price": price })
}
