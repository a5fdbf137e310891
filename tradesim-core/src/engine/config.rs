//! Simulation configuration and validation.

use crate::sizing::BuySizing;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Invalid configuration, raised once when the engine is constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },

    #[error("symbol list is empty")]
    EmptyUniverse,

    #[error("symbol list contains a blank entry")]
    BlankSymbol,

    #[error("symbol '{0}' is listed more than once")]
    DuplicateSymbol(String),

    #[error("initial cash must be finite and > 0, got {0}")]
    NonPositiveCash(f64),

    #[error("step interval must be at least one day")]
    ZeroStep,

    #[error("provider timeout must be > 0ms")]
    ZeroTimeout,

    #[error("invalid buy sizing: {0}")]
    InvalidSizing(String),
}

/// Parameters of one simulation run.
///
/// Symbols are processed in the order listed here, every simulated day. When
/// two BUYs compete for the same cash, the earlier symbol wins and the later
/// one may find too little cash left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub symbols: Vec<String>,
    /// First simulated date (inclusive).
    pub start_date: NaiveDate,
    /// Last possible simulated date (inclusive).
    pub end_date: NaiveDate,
    /// Calendar days between simulated dates.
    #[serde(default = "default_step_days")]
    pub step_days: u32,
    pub initial_cash: f64,
    #[serde(default)]
    pub buy_sizing: BuySizing,
    /// Gather prices, news and recommendations for all symbols of a day in
    /// parallel before applying them in configured order.
    #[serde(default)]
    pub parallel_fetch: bool,
    /// Deadline for each collaborator call. `None` runs calls inline with no
    /// deadline; panics are still caught.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: Option<u64>,
}

/// Collaborator deadline applied unless a run opts out.
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;

fn default_step_days() -> u32 {
    1
}

fn default_provider_timeout_ms() -> Option<u64> {
    Some(DEFAULT_PROVIDER_TIMEOUT_MS)
}

impl SimulationConfig {
    /// Daily stepping, default sizing, 30s collaborator deadline.
    pub fn new(
        symbols: Vec<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        initial_cash: f64,
    ) -> Self {
        Self {
            symbols,
            start_date,
            end_date,
            step_days: default_step_days(),
            initial_cash,
            buy_sizing: BuySizing::default(),
            parallel_fetch: false,
            provider_timeout_ms: default_provider_timeout_ms(),
        }
    }

    pub fn with_step_days(mut self, step_days: u32) -> Self {
        self.step_days = step_days;
        self
    }

    pub fn with_sizing(mut self, buy_sizing: BuySizing) -> Self {
        self.buy_sizing = buy_sizing;
        self
    }

    pub fn with_parallel_fetch(mut self, parallel_fetch: bool) -> Self {
        self.parallel_fetch = parallel_fetch;
        self
    }

    pub fn with_timeout_ms(mut self, millis: u64) -> Self {
        self.provider_timeout_ms = Some(millis);
        self
    }

    /// Run collaborator calls inline on the engine thread.
    pub fn without_timeout(mut self) -> Self {
        self.provider_timeout_ms = None;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date > self.end_date {
            return Err(ConfigError::StartAfterEnd {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if symbol.trim().is_empty() {
                return Err(ConfigError::BlankSymbol);
            }
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::DuplicateSymbol(symbol.clone()));
            }
        }
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(ConfigError::NonPositiveCash(self.initial_cash));
        }
        if self.step_days == 0 {
            return Err(ConfigError::ZeroStep);
        }
        if self.provider_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        self.buy_sizing.validate().map_err(ConfigError::InvalidSizing)
    }

    pub fn provider_timeout(&self) -> Option<Duration> {
        self.provider_timeout_ms.map(Duration::from_millis)
    }

    /// The date after `date` in the horizon, or `None` past the end.
    pub fn next_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        date.checked_add_days(Days::new(u64::from(self.step_days)))
            .filter(|next| *next <= self.end_date)
    }

    /// Every date the simulation will visit, in order.
    pub fn simulated_dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        if self.start_date > self.end_date || self.step_days == 0 {
            return dates;
        }
        let mut current = Some(self.start_date);
        while let Some(date) = current {
            dates.push(date);
            current = self.next_date(date);
        }
        dates
    }

    /// Deterministic identifier for this configuration (BLAKE3 over canonical JSON).
    ///
    /// Two runs with identical configs share a run id.
    pub fn run_id(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
