//! Engine state, per-day reports and warning records.

use crate::decision::{Decision, HoldReason};
use crate::domain::ValuationPoint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationPhase {
    Initialized,
    Stepping,
    Completed,
}

/// Category of a degraded symbol/day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    PriceUnavailable,
    NewsFailed,
    RecommendationFailed,
    MalformedRecommendation,
    TradeRejected,
}

impl WarningKind {
    /// Warning category for a forced hold; `None` for holds that were chosen.
    pub fn for_hold(reason: &HoldReason) -> Option<Self> {
        match reason {
            HoldReason::PriceUnavailable(_) => Some(Self::PriceUnavailable),
            HoldReason::NewsFailed(_) => Some(Self::NewsFailed),
            HoldReason::EngineError(_) => Some(Self::RecommendationFailed),
            HoldReason::Malformed(_) => Some(Self::MalformedRecommendation),
            HoldReason::Rejected(_) => Some(Self::TradeRejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceUnavailable => "price_unavailable",
            Self::NewsFailed => "news_failed",
            Self::RecommendationFailed => "recommendation_failed",
            Self::MalformedRecommendation => "malformed_recommendation",
            Self::TradeRejected => "trade_rejected",
        }
    }
}

/// A symbol/day that fell back to HOLD because something went wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationWarning {
    pub date: NaiveDate,
    pub symbol: String,
    pub kind: WarningKind,
    pub message: String,
}

/// What happened to one symbol on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    /// Price fetched today (`None` when unavailable).
    pub price: Option<f64>,
    pub article_count: usize,
    /// Final decision after any downgrade. `Buy`/`Sell` means the trade was applied.
    pub decision: Decision,
}

/// Summary of one completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub outcomes: Vec<SymbolOutcome>,
    pub total_value: f64,
    pub cash: f64,
}

impl DayReport {
    /// Number of trades applied on this day.
    pub fn trade_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.decision, Decision::Hold { .. }))
            .count()
    }
}

/// Mutable state owned by the engine, advanced one day per step.
///
/// Between steps every field is consistent with the portfolio, so callers
/// may inspect it through `&SimulationEngine` at any checkpoint.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub phase: SimulationPhase,
    /// Last simulated date (`None` before the first step).
    pub current_date: Option<NaiveDate>,
    /// Date the next step will simulate (`None` once completed).
    pub next_date: Option<NaiveDate>,
    pub valuation_history: Vec<ValuationPoint>,
    /// Last fetched price per symbol, carried forward over unavailable days.
    pub last_known_prices: HashMap<String, f64>,
    pub warnings: Vec<SimulationWarning>,
    pub days: Vec<DayReport>,
}

impl SimulationState {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            phase: SimulationPhase::Initialized,
            current_date: None,
            next_date: Some(start_date),
            valuation_history: Vec::new(),
            last_known_prices: HashMap::new(),
            warnings: Vec::new(),
            days: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SimulationPhase::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let state = SimulationState::new(start);
        assert_eq!(state.phase, SimulationPhase::Initialized);
        assert_eq!(state.next_date, Some(start));
        assert!(state.current_date.is_none());
        assert!(state.valuation_history.is_empty());
        assert!(!state.is_complete());
    }

    #[test]
    fn warning_kind_only_for_forced_holds() {
        assert_eq!(WarningKind::for_hold(&HoldReason::Recommended), None);
        assert_eq!(WarningKind::for_hold(&HoldReason::Unaffordable), None);
        assert_eq!(
            WarningKind::for_hold(&HoldReason::Malformed("bad".into())),
            Some(WarningKind::MalformedRecommendation)
        );
        assert_eq!(
            WarningKind::for_hold(&HoldReason::PriceUnavailable("gone".into())),
            Some(WarningKind::PriceUnavailable)
        );
    }

    #[test]
    fn trade_count_ignores_holds() {
        let report = DayReport {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            outcomes: vec![
                SymbolOutcome {
                    symbol: "A".into(),
                    price: Some(10.0),
                    article_count: 0,
                    decision: Decision::Buy { quantity: 1.0 },
                },
                SymbolOutcome {
                    symbol: "B".into(),
                    price: None,
                    article_count: 0,
                    decision: Decision::Hold {
                        reason: HoldReason::PriceUnavailable("x".into()),
                    },
                },
            ],
            total_value: 100.0,
            cash: 90.0,
        };
        assert_eq!(report.trade_count(), 1);
    }
}
