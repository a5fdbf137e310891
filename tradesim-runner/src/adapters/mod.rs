//! Concrete collaborators for the simulation engine.
//!
//! - `prices`: historical price table (CSV, synthetic, Yahoo) with as-of lookup
//! - `news`: NewsAPI client and JSON article files
//! - `llm`: chat-completions recommendation engine
//! - `scripted`: replayable recommendations from a JSON file

pub mod circuit_breaker;
pub mod http;
pub mod llm;
pub mod news;
pub mod prices;
pub mod scripted;
pub mod yahoo;

use std::path::PathBuf;
use thiserror::Error;
use tradesim_core::ProviderError;

pub use circuit_breaker::CircuitBreaker;
pub use llm::{ChatCompletionsEngine, ChatSettings};
pub use news::{ArticleFile, NewsApiProvider};
pub use prices::{HistoricalPrices, LookupMode, PriceTable};
pub use scripted::ScriptedEngine;
pub use yahoo::YahooClient;

/// Errors while loading adapter data up front (before any simulated day).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid row in {path}: {reason}")]
    InvalidRow { path: PathBuf, reason: String },

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

pub(crate) fn read_file(path: &std::path::Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
