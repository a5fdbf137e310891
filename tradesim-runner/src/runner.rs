//! Runner — turns a run file into collaborators, drives the engine and
//! packages the result.
//!
//! Two entry points:
//! - `run_simulation()`: builds collaborators from a `RunFile`. Used by the CLI.
//! - `run_with_collaborators()`: takes ready-made collaborators. Used by tests
//!   and callers that bring their own providers.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Days, Utc};
use thiserror::Error;
use tracing::{info, warn};

use tradesim_core::{
    ConfigError, NewsProvider, NoNews, PriceProvider, ProviderError, RecommendationEngine,
    SimulationConfig, SimulationEngine, SimulationError,
};

use crate::adapters::{
    ArticleFile, ChatCompletionsEngine, CircuitBreaker, HistoricalPrices, LoadError,
    NewsApiProvider, PriceTable, ScriptedEngine, YahooClient,
};
use crate::config::{
    NewsSource, PriceSource, RecommendationSource, RunConfigError, RunFile,
};
use crate::result::{RunMetadata, RunRecord, SourceNames, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] RunConfigError),
    #[error("invalid simulation: {0}")]
    Engine(#[from] ConfigError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("[{section}] source needs an API key in ${var}")]
    MissingApiKey { section: &'static str, var: String },
    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Everything the engine talks to, plus price provenance.
pub struct Collaborators {
    pub prices: Arc<dyn PriceProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub recommender: Arc<dyn RecommendationEngine>,
    pub has_synthetic: bool,
    pub dataset_hash: Option<String>,
}

impl Collaborators {
    pub fn new(
        prices: Arc<dyn PriceProvider>,
        news: Arc<dyn NewsProvider>,
        recommender: Arc<dyn RecommendationEngine>,
    ) -> Self {
        Self {
            prices,
            news,
            recommender,
            has_synthetic: false,
            dataset_hash: None,
        }
    }
}

/// Build collaborators, reading API keys from the process environment.
pub fn build_collaborators(run: &RunFile) -> Result<Collaborators, RunError> {
    build_collaborators_with_env(run, |var| std::env::var(var).ok())
}

/// Build collaborators with an explicit environment lookup.
pub fn build_collaborators_with_env<E>(run: &RunFile, env: E) -> Result<Collaborators, RunError>
where
    E: Fn(&str) -> Option<String>,
{
    let key = |var: &str| env(var).filter(|v| !v.trim().is_empty());
    let sim = &run.simulation;

    let table = match run.prices.source {
        PriceSource::Csv => match &run.prices.path {
            Some(path) => PriceTable::from_csv_path(path)?,
            None => {
                return Err(RunConfigError::MissingPath {
                    section: "prices",
                    source_name: "csv",
                }
                .into())
            }
        },
        PriceSource::Synthetic => PriceTable::synthetic(&sim.symbols, sim.start_date, sim.end_date),
        PriceSource::Yahoo => {
            let client = YahooClient::new(Arc::new(CircuitBreaker::default_for("yahoo")))?;
            // Reach back far enough for the first as-of lookup.
            let from = sim
                .start_date
                .checked_sub_days(Days::new(u64::from(run.prices.max_staleness_days)))
                .unwrap_or(sim.start_date);
            PriceTable::from_yahoo(&client, &sim.symbols, from, sim.end_date)
        }
    };
    for symbol in &sim.symbols {
        if table.series(symbol).is_none() {
            warn!(symbol = %symbol, "no prices loaded; symbol will be held every day");
        }
    }
    let dataset_hash = table.dataset_hash();
    let prices = HistoricalPrices::new(
        run.prices.source.as_str(),
        table,
        run.prices.lookup,
        run.prices.max_staleness_days,
    );

    let news: Arc<dyn NewsProvider> = match run.news.source {
        NewsSource::None => Arc::new(NoNews),
        NewsSource::File => match &run.news.path {
            Some(path) => Arc::new(ArticleFile::from_path(path, run.news.max_articles)?),
            None => {
                return Err(RunConfigError::MissingPath {
                    section: "news",
                    source_name: "file",
                }
                .into())
            }
        },
        NewsSource::NewsApi => Arc::new(NewsApiProvider::new(
            key(&run.news.api_key_env),
            run.news.max_articles,
            run.news.base_url.clone(),
            Arc::new(CircuitBreaker::default_for("news_api")),
        )?),
    };

    let recs = &run.recommendations;
    let recommender: Arc<dyn RecommendationEngine> = match recs.source {
        RecommendationSource::Scripted => match &recs.path {
            Some(path) => Arc::new(ScriptedEngine::from_path(path)?),
            None => {
                return Err(RunConfigError::MissingPath {
                    section: "recommendations",
                    source_name: "scripted",
                }
                .into())
            }
        },
        RecommendationSource::ChatCompletions => {
            let api_key = key(&recs.api_key_env).ok_or_else(|| RunError::MissingApiKey {
                section: "recommendations",
                var: recs.api_key_env.clone(),
            })?;
            Arc::new(ChatCompletionsEngine::new(
                api_key,
                recs.chat_settings(),
                Arc::new(CircuitBreaker::default_for("chat_completions")),
            )?)
        }
    };

    Ok(Collaborators {
        prices: Arc::new(prices),
        news,
        recommender,
        has_synthetic: run.prices.source == PriceSource::Synthetic,
        dataset_hash: Some(dataset_hash),
    })
}

/// Validate the run file, build its collaborators and run to completion.
pub fn run_simulation(run: &RunFile) -> Result<RunRecord, RunError> {
    run.validate()?;
    let collaborators = build_collaborators(run)?;
    run_with_collaborators(run.simulation.clone(), collaborators)
}

/// Run a simulation with pre-built collaborators.
pub fn run_with_collaborators(
    config: SimulationConfig,
    collaborators: Collaborators,
) -> Result<RunRecord, RunError> {
    let started = Instant::now();
    let timestamp = Utc::now();
    let sources = SourceNames {
        prices: collaborators.prices.name().to_string(),
        news: collaborators.news.name().to_string(),
        recommendations: collaborators.recommender.name().to_string(),
    };

    let mut engine = SimulationEngine::new(
        config,
        collaborators.prices,
        collaborators.news,
        collaborators.recommender,
    )?;
    let result = engine.run()?;

    let record = RunRecord {
        schema_version: SCHEMA_VERSION,
        result,
        sources,
        has_synthetic: collaborators.has_synthetic,
        dataset_hash: collaborators.dataset_hash,
        metadata: RunMetadata {
            timestamp,
            duration_secs: started.elapsed().as_secs_f64(),
        },
    };
    info!(
        run_id = record.run_id(),
        final_value = record.result.final_value,
        trades = record.trade_count(),
        warnings = record.warning_count(),
        "run finished"
    );
    Ok(record)
}
