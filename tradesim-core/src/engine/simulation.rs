//! SimulationEngine — the day-by-day loop.
//!
//! Each step simulates one date:
//! 1. For every symbol, in configured order: price → articles → recommendation
//! 2. `decide()` turns the recommendation into a buy, sell or hold
//! 3. The portfolio applies the trade (rejections downgrade to hold)
//! 4. The day's valuation is appended to the history
//!
//! Collaborator failures never abort a run. They degrade the affected symbol
//! to HOLD for that day and leave a warning in the state.

use std::sync::Arc;

use chrono::NaiveDate;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::decision::{decide, Decision, DecisionInput, HoldReason};
use crate::domain::{Portfolio, RawRecommendation, ValuationPoint};
use crate::engine::config::{ConfigError, SimulationConfig};
use crate::engine::state::{
    DayReport, SimulationPhase, SimulationState, SimulationWarning, SymbolOutcome, WarningKind,
};
use crate::engine::timeout::call_with_deadline;
use crate::providers::{
    NewsProvider, PriceProvider, ProviderError, RecommendationEngine, RecommendationRequest,
};
use crate::result::SimulationResult;

/// Errors returned to callers driving the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("simulation already completed (last date {last_date:?}); no further steps accepted")]
    AlreadyComplete { last_date: Option<NaiveDate> },
}

/// Collaborator answers for one symbol on one day, gathered before any trading.
#[derive(Debug)]
enum Gathered {
    NoPrice(ProviderError),
    NoNews {
        price: f64,
        error: ProviderError,
    },
    Ready {
        price: f64,
        article_count: usize,
        recommendation: Result<RawRecommendation, ProviderError>,
    },
}

/// Drives a [`Portfolio`] through the configured date horizon.
pub struct SimulationEngine {
    config: SimulationConfig,
    portfolio: Portfolio,
    state: SimulationState,
    prices: Arc<dyn PriceProvider>,
    news: Arc<dyn NewsProvider>,
    recommender: Arc<dyn RecommendationEngine>,
}

impl SimulationEngine {
    /// Validate `config` and set up an engine in the `Initialized` phase.
    pub fn new(
        config: SimulationConfig,
        prices: Arc<dyn PriceProvider>,
        news: Arc<dyn NewsProvider>,
        recommender: Arc<dyn RecommendationEngine>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            symbols = ?config.symbols,
            start = %config.start_date,
            end = %config.end_date,
            step_days = config.step_days,
            initial_cash = config.initial_cash,
            sizing = config.buy_sizing.name(),
            prices = prices.name(),
            news = news.name(),
            recommender = recommender.name(),
            "simulation configured"
        );
        Ok(Self {
            portfolio: Portfolio::new(config.initial_cash),
            state: SimulationState::new(config.start_date),
            config,
            prices,
            news,
            recommender,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> SimulationPhase {
        self.state.phase
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Steps left before completion.
    pub fn remaining_days(&self) -> usize {
        let mut remaining = 0;
        let mut next = self.state.next_date;
        while let Some(date) = next {
            remaining += 1;
            next = self.config.next_date(date);
        }
        remaining
    }

    /// Simulate the next date of the horizon.
    pub fn step(&mut self) -> Result<&DayReport, SimulationError> {
        let date = match (self.state.phase, self.state.next_date) {
            (SimulationPhase::Completed, _) | (_, None) => {
                return Err(SimulationError::AlreadyComplete {
                    last_date: self.state.current_date,
                })
            }
            (_, Some(date)) => date,
        };
        self.state.phase = SimulationPhase::Stepping;
        self.state.current_date = Some(date);
        debug!(%date, "step");

        // Snapshot of symbols so the loop can borrow self mutably.
        let symbols = self.config.symbols.clone();
        let prefetched: Vec<Gathered> = if self.config.parallel_fetch {
            symbols
                .par_iter()
                .map(|symbol| self.gather(symbol, date))
                .collect()
        } else {
            Vec::new()
        };
        let mut prefetched = prefetched.into_iter();

        let mut outcomes = Vec::with_capacity(symbols.len());
        for symbol in &symbols {
            let inputs = match prefetched.next() {
                Some(inputs) => inputs,
                None => self.gather(symbol, date),
            };
            outcomes.push(self.apply(symbol, date, inputs));
        }

        let total_value = self.portfolio.value_at(&self.state.last_known_prices);
        self.state.valuation_history.push(ValuationPoint { date, total_value });
        info!(
            %date,
            total_value,
            cash = self.portfolio.cash(),
            positions = self.portfolio.holdings().len(),
            "end of day"
        );

        self.state.days.push(DayReport {
            date,
            outcomes,
            total_value,
            cash: self.portfolio.cash(),
        });

        self.state.next_date = self.config.next_date(date);
        if self.state.next_date.is_none() {
            self.state.phase = SimulationPhase::Completed;
            info!(final_value = total_value, "simulation complete");
        }

        let last = self.state.days.len() - 1;
        Ok(&self.state.days[last])
    }

    /// Step until the horizon is exhausted and return the result.
    pub fn run(&mut self) -> Result<SimulationResult, SimulationError> {
        if self.is_complete() {
            return Err(SimulationError::AlreadyComplete {
                last_date: self.state.current_date,
            });
        }
        while !self.is_complete() {
            self.step()?;
        }
        Ok(self.result())
    }

    /// Result snapshot of the state so far.
    pub fn result(&self) -> SimulationResult {
        SimulationResult::from_parts(&self.config, &self.portfolio, &self.state)
    }

    /// Consume the engine into its result, whether or not it ran to completion.
    pub fn into_result(self) -> SimulationResult {
        SimulationResult::from_parts(&self.config, &self.portfolio, &self.state)
    }

    /// Ask the collaborators about one symbol. Touches no engine state.
    fn gather(&self, symbol: &str, date: NaiveDate) -> Gathered {
        let deadline = self.config.provider_timeout();

        let price = {
            let provider = Arc::clone(&self.prices);
            let name = provider.name().to_string();
            let sym = symbol.to_string();
            call_with_deadline(deadline, &name, move || provider.price(&sym, date))
        };
        let price = match price {
            Ok(p) if p.is_finite() && p > 0.0 => p,
            Ok(p) => {
                return Gathered::NoPrice(ProviderError::MalformedResponse(format!(
                    "non-positive price {p} for {symbol}"
                )))
            }
            Err(e) => return Gathered::NoPrice(e),
        };

        let articles = {
            let provider = Arc::clone(&self.news);
            let name = provider.name().to_string();
            let sym = symbol.to_string();
            call_with_deadline(deadline, &name, move || provider.articles(&sym, date))
        };
        let articles = match articles {
            Ok(articles) => articles,
            Err(error) => return Gathered::NoNews { price, error },
        };
        let article_count = articles.len();

        let request = RecommendationRequest {
            symbol: symbol.to_string(),
            articles,
            price,
            date,
        };
        let recommendation = {
            let engine = Arc::clone(&self.recommender);
            let name = engine.name().to_string();
            call_with_deadline(deadline, &name, move || engine.recommend(&request))
        };

        Gathered::Ready {
            price,
            article_count,
            recommendation,
        }
    }

    /// Apply one symbol's gathered inputs to the portfolio.
    fn apply(&mut self, symbol: &str, date: NaiveDate, inputs: Gathered) -> SymbolOutcome {
        let (price, article_count, decision) = match inputs {
            Gathered::NoPrice(e) => (
                None,
                0,
                Decision::Hold {
                    reason: HoldReason::PriceUnavailable(e.to_string()),
                },
            ),
            Gathered::NoNews { price, error } => {
                self.state
                    .last_known_prices
                    .insert(symbol.to_string(), price);
                (
                    Some(price),
                    0,
                    Decision::Hold {
                        reason: HoldReason::NewsFailed(error.to_string()),
                    },
                )
            }
            Gathered::Ready {
                price,
                article_count,
                recommendation,
            } => {
                self.state
                    .last_known_prices
                    .insert(symbol.to_string(), price);
                let decision = decide(DecisionInput {
                    outcome: &recommendation,
                    price,
                    held: self.portfolio.shares(symbol),
                    cash: self.portfolio.cash(),
                    sizing: &self.config.buy_sizing,
                });
                let decision = execute(&mut self.portfolio, symbol, price, date, decision);
                (Some(price), article_count, decision)
            }
        };

        if let Decision::Hold { reason } = &decision {
            match WarningKind::for_hold(reason) {
                Some(kind) => {
                    warn!(%date, symbol, kind = kind.as_str(), "holding: {reason}");
                    self.state.warnings.push(SimulationWarning {
                        date,
                        symbol: symbol.to_string(),
                        kind,
                        message: reason.to_string(),
                    });
                }
                None => debug!(%date, symbol, "holding: {reason}"),
            }
        }

        SymbolOutcome {
            symbol: symbol.to_string(),
            price,
            article_count,
            decision,
        }
    }
}

/// Carry out a buy/sell decision; a portfolio rejection becomes a hold.
///
/// `decide` sizes against the same cash and holdings, so rejections only
/// happen when the two disagree.
fn execute(
    portfolio: &mut Portfolio,
    symbol: &str,
    price: f64,
    date: NaiveDate,
    decision: Decision,
) -> Decision {
    let result = match decision {
        Decision::Buy { quantity } => portfolio.buy(symbol, price, quantity, date),
        Decision::Sell { quantity } => portfolio.sell(symbol, price, quantity, date),
        Decision::Hold { .. } => return decision,
    };
    match result {
        Ok(tx) => {
            info!(
                %date,
                symbol,
                action = %tx.action,
                quantity = tx.quantity,
                price = tx.price,
                cash = tx.resulting_cash,
                "trade applied"
            );
            decision
        }
        Err(e) => Decision::Hold {
            reason: HoldReason::Rejected(e.to_string()),
        },
    }
}
