//! Portfolio — cash balance, holdings and the transaction log.

use super::holdings::Holdings;
use super::transaction::{TradeAction, Transaction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Reasons a buy or sell is rejected. A rejected call leaves the portfolio untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("insufficient funds: need {required:.2}, have {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: f64,
        held: f64,
    },

    #[error("invalid price {price}: must be finite and > 0")]
    InvalidPrice { price: f64 },

    #[error("invalid quantity {quantity}: must be finite and > 0")]
    InvalidQuantity { quantity: f64 },
}

/// Cash + shares ledger.
///
/// Mutated only through [`Portfolio::buy`] and [`Portfolio::sell`]. Both are
/// atomic: every check runs before any field changes, so a rejected trade
/// leaves cash, holdings and the log exactly as they were. `cash >= 0` and
/// every holding `>= 0` hold after every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    initial_cash: f64,
    cash: f64,
    holdings: Holdings,
    transactions: Vec<Transaction>,
    /// Price each symbol last traded at, used when valuing without a quote.
    last_trade_prices: BTreeMap<String, f64>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            holdings: Holdings::new(),
            transactions: Vec::new(),
            last_trade_prices: BTreeMap::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn holdings(&self) -> &Holdings {
        &self.holdings
    }

    /// Shares held for `symbol` (0.0 when not held).
    pub fn shares(&self, symbol: &str) -> f64 {
        self.holdings.get(symbol)
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn last_trade_price(&self, symbol: &str) -> Option<f64> {
        self.last_trade_prices.get(symbol).copied()
    }

    /// Buy `quantity` shares at `price`. No margin: the full cost must be covered by cash.
    pub fn buy(
        &mut self,
        symbol: &str,
        price: f64,
        quantity: f64,
        date: NaiveDate,
    ) -> Result<&Transaction, PortfolioError> {
        check_price(price)?;
        check_quantity(quantity)?;

        let cost = price * quantity;
        if cost > self.cash {
            return Err(PortfolioError::InsufficientFunds {
                required: cost,
                available: self.cash,
            });
        }

        self.holdings.add(symbol, quantity)?;
        self.cash = (self.cash - cost).max(0.0);
        Ok(self.record(date, symbol, TradeAction::Buy, price, quantity))
    }

    /// Sell `quantity` shares at `price`. The quantity must be covered by current holdings.
    pub fn sell(
        &mut self,
        symbol: &str,
        price: f64,
        quantity: f64,
        date: NaiveDate,
    ) -> Result<&Transaction, PortfolioError> {
        check_price(price)?;
        check_quantity(quantity)?;

        self.holdings.remove(symbol, quantity)?;
        self.cash += price * quantity;
        Ok(self.record(date, symbol, TradeAction::Sell, price, quantity))
    }

    /// Total value = cash + Σ shares × price.
    ///
    /// A held symbol missing from `prices` is valued at its last trade price,
    /// or at zero if it has never been priced.
    pub fn value_at(&self, prices: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .holdings
            .iter()
            .map(|(sym, qty)| {
                let price = prices
                    .get(sym)
                    .copied()
                    .or_else(|| self.last_trade_price(sym))
                    .unwrap_or(0.0);
                qty * price
            })
            .sum();
        self.cash + position_value
    }

    fn record(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        action: TradeAction,
        price: f64,
        quantity: f64,
    ) -> &Transaction {
        self.last_trade_prices.insert(symbol.to_string(), price);
        self.transactions.push(Transaction {
            date,
            symbol: symbol.to_string(),
            action,
            price,
            quantity,
            resulting_cash: self.cash,
        });
        // Just pushed, so the log is non-empty.
        &self.transactions[self.transactions.len() - 1]
    }
}

fn check_price(price: f64) -> Result<(), PortfolioError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(PortfolioError::InvalidPrice { price })
    }
}

fn check_quantity(quantity: f64) -> Result<(), PortfolioError> {
    if quantity.is_finite() && quantity > 0.0 {
        Ok(())
    } else {
        Err(PortfolioError::InvalidQuantity { quantity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn prices(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
    }

    #[test]
    fn buy_deducts_cash_and_adds_shares() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.buy("SYM", 50.0, 10.0, day(2)).unwrap();
        assert_eq!(portfolio.cash(), 500.0);
        assert_eq!(portfolio.shares("SYM"), 10.0);
        assert_eq!(portfolio.transactions().len(), 1);
        assert_eq!(portfolio.transactions()[0].resulting_cash, 500.0);
    }

    #[test]
    fn buy_without_enough_cash_is_a_no_op() {
        let mut portfolio = Portfolio::new(400.0);
        let before = portfolio.clone();
        let err = portfolio.buy("SYM", 50.0, 10.0, day(2)).unwrap_err();
        assert_eq!(
            err,
            PortfolioError::InsufficientFunds {
                required: 500.0,
                available: 400.0
            }
        );
        assert_eq!(portfolio, before);
        assert_eq!(portfolio.cash(), 400.0);
    }

    #[test]
    fn buy_spending_exactly_all_cash_is_allowed() {
        let mut portfolio = Portfolio::new(500.0);
        portfolio.buy("SYM", 50.0, 10.0, day(2)).unwrap();
        assert_eq!(portfolio.cash(), 0.0);
    }

    #[test]
    fn sell_adds_cash_and_reduces_shares() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.buy("SYM", 50.0, 10.0, day(2)).unwrap();
        portfolio.sell("SYM", 60.0, 5.0, day(3)).unwrap();
        assert_eq!(portfolio.cash(), 800.0);
        assert_eq!(portfolio.shares("SYM"), 5.0);
        let last = portfolio.transactions().last().unwrap();
        assert_eq!(last.action, TradeAction::Sell);
        assert_eq!(last.resulting_cash, 800.0);
    }

    #[test]
    fn sell_without_shares_is_a_no_op() {
        let mut portfolio = Portfolio::new(1000.0);
        let before = portfolio.clone();
        let err = portfolio.sell("SYM", 60.0, 5.0, day(3)).unwrap_err();
        assert!(matches!(err, PortfolioError::InsufficientShares { held, .. } if held == 0.0));
        assert_eq!(portfolio, before);
    }

    #[test]
    fn selling_everything_removes_the_entry() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.buy("SYM", 50.0, 10.0, day(2)).unwrap();
        portfolio.sell("SYM", 55.0, 10.0, day(3)).unwrap();
        assert!(portfolio.holdings().is_empty());
        assert_eq!(portfolio.cash(), 1050.0);
    }

    #[test]
    fn invalid_inputs_rejected() {
        let mut portfolio = Portfolio::new(1000.0);
        assert!(matches!(
            portfolio.buy("SYM", 0.0, 1.0, day(2)),
            Err(PortfolioError::InvalidPrice { .. })
        ));
        assert!(matches!(
            portfolio.buy("SYM", 10.0, -1.0, day(2)),
            Err(PortfolioError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            portfolio.sell("SYM", f64::NAN, 1.0, day(2)),
            Err(PortfolioError::InvalidPrice { .. })
        ));
        assert!(portfolio.transactions().is_empty());
    }

    #[test]
    fn value_of_fresh_portfolio_is_initial_cash() {
        let portfolio = Portfolio::new(1000.0);
        assert_eq!(portfolio.value_at(&HashMap::new()), 1000.0);
        assert_eq!(portfolio.value_at(&prices(&[("SYM", 123.0)])), 1000.0);
    }

    #[test]
    fn value_uses_supplied_price() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.buy("SYM", 50.0, 10.0, day(2)).unwrap();
        // 500 cash + 10 × 70
        assert_eq!(portfolio.value_at(&prices(&[("SYM", 70.0)])), 1200.0);
    }

    #[test]
    fn value_falls_back_to_last_trade_price() {
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.buy("SYM", 50.0, 10.0, day(2)).unwrap();
        assert_eq!(portfolio.value_at(&HashMap::new()), 1000.0);
        portfolio.sell("SYM", 60.0, 5.0, day(3)).unwrap();
        // 800 cash + 5 × 60 (last trade)
        assert_eq!(portfolio.value_at(&HashMap::new()), 1100.0);
    }

    #[test]
    fn never_priced_holding_is_valued_at_zero() {
        // A holding only exists after a buy, which records a trade price;
        // clear the price memory to reach the never-priced case.
        let mut portfolio = Portfolio::new(1000.0);
        portfolio.buy("SYM", 50.0, 10.0, day(2)).unwrap();
        portfolio.last_trade_prices.clear();
        assert_eq!(portfolio.value_at(&HashMap::new()), 500.0);
        assert_eq!(portfolio.value_at(&prices(&[("SYM", 40.0)])), 900.0);
    }
}
