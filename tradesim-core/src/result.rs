//! Structured output of a simulation run.

use crate::domain::{Holdings, Portfolio, Transaction, ValuationPoint};
use crate::engine::config::SimulationConfig;
use crate::engine::state::{DayReport, SimulationState, SimulationWarning};
use serde::{Deserialize, Serialize};

/// Final portfolio state plus the valuation history of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub run_id: String,
    pub config: SimulationConfig,
    pub initial_cash: f64,
    pub final_cash: f64,
    /// Last valuation (initial cash if no day was simulated).
    pub final_value: f64,
    pub holdings: Holdings,
    pub transactions: Vec<Transaction>,
    pub valuation_history: Vec<ValuationPoint>,
    pub warnings: Vec<SimulationWarning>,
    pub days: Vec<DayReport>,
    pub days_simulated: usize,
    pub completed: bool,
}

impl SimulationResult {
    pub fn from_parts(
        config: &SimulationConfig,
        portfolio: &Portfolio,
        state: &SimulationState,
    ) -> Self {
        let final_value = state
            .valuation_history
            .last()
            .map_or(portfolio.initial_cash(), |p| p.total_value);
        Self {
            run_id: config.run_id(),
            config: config.clone(),
            initial_cash: portfolio.initial_cash(),
            final_cash: portfolio.cash(),
            final_value,
            holdings: portfolio.holdings().clone(),
            transactions: portfolio.transactions().to_vec(),
            valuation_history: state.valuation_history.clone(),
            warnings: state.warnings.clone(),
            days: state.days.clone(),
            days_simulated: state.valuation_history.len(),
            completed: state.is_complete(),
        }
    }

    /// Return on initial cash, in percent.
    pub fn return_pct(&self) -> f64 {
        if self.initial_cash > 0.0 {
            (self.final_value / self.initial_cash - 1.0) * 100.0
        } else {
            0.0
        }
    }
}
