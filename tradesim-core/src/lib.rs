//! tradesim core — portfolio ledger and news-driven trading simulation engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (portfolio, holdings, transactions, recommendations, articles)
//! - Collaborator traits for prices, news and recommendations
//! - Buy sizing and the pure decision policy
//! - The day-by-day simulation state machine

pub mod decision;
pub mod domain;
pub mod engine;
pub mod providers;
pub mod result;
pub mod sizing;

pub use decision::{decide, Decision, DecisionInput, HoldReason};
pub use domain::{Action, Article, Holdings, Portfolio, PortfolioError, RawRecommendation};
pub use engine::{ConfigError, SimulationConfig, SimulationEngine, SimulationError};
pub use providers::{
    NewsProvider, NoNews, PriceProvider, ProviderError, RecommendationEngine,
    RecommendationRequest,
};
pub use result::SimulationResult;
pub use sizing::BuySizing;
