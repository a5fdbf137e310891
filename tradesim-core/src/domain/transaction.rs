use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of an applied trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// Record of a trade applied to the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub symbol: String,
    pub action: TradeAction,
    pub price: f64,
    pub quantity: f64,
    /// Cash balance immediately after this trade.
    pub resulting_cash: f64,
}

impl Transaction {
    /// Gross amount exchanged (price × quantity).
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}
