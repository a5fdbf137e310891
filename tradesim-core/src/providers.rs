//! Collaborator traits and structured error types.
//!
//! The engine consumes prices, news and recommendations through these traits so
//! adapters (CSV, Yahoo, NewsAPI, chat-completions, scripted replays) can be
//! swapped freely and mocked in tests. Adapters own their wire formats; the
//! engine only sees the values below.

use crate::domain::{Article, RawRecommendation};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured errors for collaborator calls.
///
/// None of these are fatal to a simulation: the engine downgrades the
/// affected symbol to HOLD for that day and records a warning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("no data for {symbol} on {date}")]
    Unavailable { symbol: String, date: NaiveDate },

    #[error("{provider} call timed out after {millis}ms")]
    Timeout { provider: String, millis: u64 },

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication required: {0}")]
    Authentication(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("hard stop: provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("provider error: {0}")]
    Other(String),
}

/// Everything the recommendation engine is given for one symbol on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub symbol: String,
    pub articles: Vec<Article>,
    pub price: f64,
    pub date: NaiveDate,
}

/// Source of historical prices.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Price of `symbol` on `date`, or [`ProviderError::Unavailable`].
    fn price(&self, symbol: &str, date: NaiveDate) -> Result<f64, ProviderError>;
}

/// Source of news articles.
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Articles about `symbol` for `date`, in provider order. An empty list is
    /// a valid answer, not an error.
    fn articles(&self, symbol: &str, date: NaiveDate) -> Result<Vec<Article>, ProviderError>;
}

/// Source of trading recommendations (typically a language model).
pub trait RecommendationEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Unvalidated recommendation; the engine checks it before acting.
    fn recommend(&self, request: &RecommendationRequest)
        -> Result<RawRecommendation, ProviderError>;
}

/// News provider that never has articles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNews;

impl NewsProvider for NoNews {
    fn name(&self) -> &str {
        "none"
    }

    fn articles(&self, _symbol: &str, _date: NaiveDate) -> Result<Vec<Article>, ProviderError> {
        Ok(Vec::new())
    }
}
