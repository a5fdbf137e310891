//! Domain types for tradesim

pub mod article;
pub mod holdings;
pub mod portfolio;
pub mod recommendation;
pub mod transaction;
pub mod valuation;

pub use article::Article;
pub use holdings::Holdings;
pub use portfolio::{Portfolio, PortfolioError};
pub use recommendation::{Action, RawRecommendation, Recommendation, RecommendationError};
pub use transaction::{TradeAction, Transaction};
pub use valuation::ValuationPoint;

/// Symbol type alias
pub type Symbol = String;
