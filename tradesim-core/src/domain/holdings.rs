//! Holdings — per-symbol share counts with a non-negativity invariant.

use super::portfolio::PortfolioError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quantities at or below this are treated as a closed position.
pub const DUST: f64 = 1e-9;

/// Share counts keyed by symbol.
///
/// Every entry is strictly positive. Removing shares can never drive an
/// entry below zero; an entry that reaches zero is dropped. Iteration is in
/// symbol order so serialized output is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Holdings {
    shares: BTreeMap<String, f64>,
}

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares held for `symbol` (0.0 when not held).
    pub fn get(&self, symbol: &str) -> f64 {
        self.shares.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.shares.contains_key(symbol)
    }

    /// Add shares to a symbol. Non-positive quantities are rejected.
    pub fn add(&mut self, symbol: &str, quantity: f64) -> Result<(), PortfolioError> {
        if !(quantity.is_finite() && quantity > 0.0) {
            return Err(PortfolioError::InvalidQuantity { quantity });
        }
        *self.shares.entry(symbol.to_string()).or_insert(0.0) += quantity;
        Ok(())
    }

    /// Remove shares from a symbol, dropping the entry when it reaches zero.
    pub fn remove(&mut self, symbol: &str, quantity: f64) -> Result<(), PortfolioError> {
        if !(quantity.is_finite() && quantity > 0.0) {
            return Err(PortfolioError::InvalidQuantity { quantity });
        }
        let held = self.get(symbol);
        if quantity > held {
            return Err(PortfolioError::InsufficientShares {
                symbol: symbol.to_string(),
                requested: quantity,
                held,
            });
        }

        let remaining = held - quantity;
        if remaining <= DUST {
            self.shares.remove(symbol);
        } else {
            self.shares.insert(symbol.to_string(), remaining);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.shares.iter().map(|(sym, &qty)| (sym.as_str(), qty))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.shares.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}
