//! Buy sizing — how many whole shares a BUY recommendation turns into.
//!
//! Sizing is bounded by available cash: no policy ever produces an order the
//! portfolio cannot fund. A quantity hint on the recommendation replaces the
//! policy budget but is still capped by cash.

use serde::{Deserialize, Serialize};

/// Buy sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuySizing {
    /// Spend a fixed fraction of current cash per buy.
    FixedFraction { fraction: f64 },

    /// Spend a fixed dollar amount per buy (less if cash is short).
    FixedNotional { amount: f64 },

    /// Spend all available cash.
    AllCash,
}

impl Default for BuySizing {
    fn default() -> Self {
        Self::FixedFraction { fraction: 0.25 }
    }
}

impl BuySizing {
    /// Dollar budget for one buy given current cash.
    pub fn budget(&self, cash: f64) -> f64 {
        let cash = cash.max(0.0);
        match *self {
            Self::FixedFraction { fraction } => cash * fraction.clamp(0.0, 1.0),
            Self::FixedNotional { amount } => amount.max(0.0).min(cash),
            Self::AllCash => cash,
        }
    }

    /// Whole shares to buy at `price`.
    ///
    /// Returns 0.0 when nothing is affordable. With a `hint`, buys
    /// `min(floor(hint), floor(cash / price))`; hints below one share are
    /// turned away by the decision policy before sizing.
    pub fn quantity(&self, cash: f64, price: f64, hint: Option<f64>) -> f64 {
        if !(price.is_finite() && price > 0.0) || cash <= 0.0 {
            return 0.0;
        }
        let affordable = whole_shares(cash, price, cash);
        let wanted = match hint {
            Some(h) => h.floor(),
            None => whole_shares(self.budget(cash), price, cash),
        };
        wanted.min(affordable).max(0.0)
    }

    /// Error message if the policy parameters are out of range.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::FixedFraction { fraction } if !(fraction > 0.0 && fraction <= 1.0) => {
                Err(format!("fraction must be in (0, 1], got {fraction}"))
            }
            Self::FixedNotional { amount } if !(amount.is_finite() && amount > 0.0) => {
                Err(format!("amount must be > 0, got {amount}"))
            }
            _ => Ok(()),
        }
    }

    /// Policy name for manifests/logging
    pub fn name(&self) -> &str {
        match self {
            Self::FixedFraction { .. } => "FixedFraction",
            Self::FixedNotional { .. } => "FixedNotional",
            Self::AllCash => "AllCash",
        }
    }
}

/// Whole shares purchasable with `budget`, never costing more than `cash`.
fn whole_shares(budget: f64, price: f64, cash: f64) -> f64 {
    let mut qty = (budget / price).floor();
    // floor() of a quotient that rounded up can still overspend by an ulp.
    while qty > 0.0 && qty * price > cash {
        qty -= 1.0;
    }
    qty.max(0.0)
}
