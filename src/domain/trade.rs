//! Trade-side inputs to the simulated equity ledger.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parse a side label. Anything other than `buy` is treated as a sell.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("buy") {
            Self::Buy
        } else {
            Self::Sell
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trade fill reported by the order-execution collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub exchange: String,
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub qty: f64,
    pub bot_id: Option<String>,
    pub strategy: Option<String>,
}

impl Fill {
    pub fn new(
        exchange: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        price: f64,
        qty: f64,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
            side,
            price,
            qty,
            bot_id: None,
            strategy: None,
        }
    }

    /// Tag the fill with the bot that produced it.
    #[must_use]
    pub fn with_bot(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = Some(bot_id.into());
        self
    }

    /// Tag the fill with the strategy that produced it.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Signed cash movement: buys spend, sells receive.
    #[must_use]
    pub fn cash_delta(&self) -> f64 {
        let notional = self.price * self.qty;
        match self.side {
            Side::Buy => -notional,
            Side::Sell => notional,
        }
    }

    /// Signed position movement.
    #[must_use]
    pub fn qty_delta(&self) -> f64 {
        match self.side {
            Side::Buy => self.qty,
            Side::Sell => -self.qty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_from_label_defaults_to_sell() {
        assert_eq!(Side::from_label("BUY"), Side::Buy);
        assert_eq!(Side::from_label(" buy "), Side::Buy);
        assert_eq!(Side::from_label("sell"), Side::Sell);
        assert_eq!(Side::from_label("NA"), Side::Sell);
    }

    #[test]
    fn fill_deltas_follow_side() {
        let buy = Fill::new("binance", "BTCUSDT", Side::Buy, 30000.0, 0.5);
        assert_eq!(buy.cash_delta(), -15000.0);
        assert_eq!(buy.qty_delta(), 0.5);

        let sell = Fill::new("binance", "BTCUSDT", Side::Sell, 30000.0, 0.5);
        assert_eq!(sell.cash_delta(), 15000.0);
        assert_eq!(sell.qty_delta(), -0.5);
    }
}
