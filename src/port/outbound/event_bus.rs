//! Pub/sub event bus port.
//!
//! Trading events (fills, submitted orders, market ticks, retries) reach the
//! telemetry layer through a bus owned by the host application. This crate
//! only consumes the contract.

use std::sync::Arc;

use serde_json::Value;

/// Callback invoked with an event's payload.
pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Event names the telemetry layer listens for.
pub mod events {
    pub const ORDER_SUBMITTED: &str = "OrderSubmitted";
    pub const ORDER_FILLED: &str = "ORDER_FILLED";
    pub const TRADE_FILLED: &str = "TradeFilled";
    pub const ORDER_EXECUTED: &str = "OrderExecuted";
    pub const MARKET_DATA_UPDATE: &str = "MarketDataUpdate";
    pub const RETRY: &str = "Retry";
    pub const RECONNECT_ATTEMPT: &str = "ReconnectAttempt";

    /// Events counted into `events_total`.
    pub const COUNTED: [&str; 5] = [
        TRADE_FILLED,
        ORDER_EXECUTED,
        MARKET_DATA_UPDATE,
        RETRY,
        RECONNECT_ATTEMPT,
    ];

    /// Events that carry a trade fill.
    pub const FILLS: [&str; 3] = [ORDER_FILLED, TRADE_FILLED, ORDER_EXECUTED];
}

/// Publish/subscribe bus.
///
/// Handlers run synchronously on the publisher's thread; a panicking or
/// failing handler must not stop delivery to the others.
pub trait EventBus: Send + Sync {
    fn subscribe(&self, event: &str, handler: EventHandler);

    fn publish(&self, event: &str, payload: &Value);
}
