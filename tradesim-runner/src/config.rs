//! TOML run file: simulation parameters plus the choice of price, news and
//! recommendation sources and where artifacts go.
//!
//! Relative paths in the file are resolved against the file's directory.

use crate::adapters::{ChatSettings, LookupMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tradesim_core::{ConfigError, SimulationConfig};

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to read run file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse run file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid simulation settings: {0}")]
    Simulation(#[from] ConfigError),

    #[error("[{section}] source '{source_name}' needs a `path`")]
    MissingPath {
        section: &'static str,
        source_name: &'static str,
    },

    #[error("[{section}] source '{source_name}' needs network access, which is disabled")]
    NetworkDisabled {
        section: &'static str,
        source_name: &'static str,
    },

    #[error("invalid [{section}] setting: {message}")]
    Invalid {
        section: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Csv,
    Synthetic,
    Yahoo,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Synthetic => "synthetic",
            Self::Yahoo => "yahoo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricesConfig {
    pub source: PriceSource,
    /// CSV file with `date,symbol,close` rows.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub lookup: LookupMode,
    /// Oldest close an as-of lookup may fall back to, in calendar days.
    #[serde(default = "default_staleness")]
    pub max_staleness_days: u32,
}

fn default_staleness() -> u32 {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsSource {
    #[default]
    None,
    File,
    NewsApi,
}

impl NewsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::File => "file",
            Self::NewsApi => "news_api",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default)]
    pub source: NewsSource,
    /// JSON article file.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Environment variable holding the NewsAPI key.
    #[serde(default = "default_news_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_articles")]
    pub max_articles: usize,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_news_key_env() -> String {
    "NEWS_API_KEY".into()
}

fn default_max_articles() -> usize {
    5
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            source: NewsSource::None,
            path: None,
            api_key_env: default_news_key_env(),
            max_articles: default_max_articles(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Scripted,
    ChatCompletions,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scripted => "scripted",
            Self::ChatCompletions => "chat_completions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsConfig {
    pub source: RecommendationSource,
    /// JSON script for the scripted source.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_llm_key_env() -> String {
    "OPENAI_API_KEY".into()
}

fn default_model() -> String {
    ChatSettings::default().model
}

fn default_temperature() -> f64 {
    ChatSettings::default().temperature
}

fn default_max_tokens() -> u32 {
    ChatSettings::default().max_tokens
}

impl RecommendationsConfig {
    pub fn chat_settings(&self) -> ChatSettings {
        let defaults = ChatSettings::default();
        ChatSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            base_url: self.base_url.clone().unwrap_or(defaults.base_url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Command-line adjustments applied on top of a run file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub output_dir: Option<PathBuf>,
    /// Replace the configured price source with synthetic prices.
    pub synthetic_prices: bool,
    /// Refuse every source that needs the network.
    pub offline: bool,
}

/// A complete run description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub simulation: SimulationConfig,
    pub prices: PricesConfig,
    #[serde(default)]
    pub news: NewsConfig,
    pub recommendations: RecommendationsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Network sources are rejected by `validate` when set.
    #[serde(skip)]
    pub offline: bool,
}

impl RunFile {
    /// Load, resolve relative paths and validate.
    pub fn from_file(path: &Path) -> Result<Self, RunConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut run = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            run.resolve_paths(base);
        }
        run.validate()?;
        Ok(run)
    }

    /// Parse without validating or resolving paths.
    pub fn from_toml(content: &str) -> Result<Self, RunConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Make relative paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(p) = self.prices.path.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.news.path.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.recommendations.path.as_mut() {
            resolve(p);
        }
        resolve(&mut self.output.dir);
    }

    pub fn apply_overrides(&mut self, overrides: &RunOverrides) {
        if let Some(dir) = &overrides.output_dir {
            self.output.dir = dir.clone();
        }
        if overrides.synthetic_prices {
            self.prices.source = PriceSource::Synthetic;
        }
        self.offline |= overrides.offline;
    }

    pub fn validate(&self) -> Result<(), RunConfigError> {
        self.simulation.validate()?;

        match self.prices.source {
            PriceSource::Csv if self.prices.path.is_none() => {
                return Err(RunConfigError::MissingPath {
                    section: "prices",
                    source_name: "csv",
                })
            }
            PriceSource::Yahoo if self.offline => {
                return Err(RunConfigError::NetworkDisabled {
                    section: "prices",
                    source_name: "yahoo",
                })
            }
            _ => {}
        }

        match self.news.source {
            NewsSource::File if self.news.path.is_none() => {
                return Err(RunConfigError::MissingPath {
                    section: "news",
                    source_name: "file",
                })
            }
            NewsSource::NewsApi if self.offline => {
                return Err(RunConfigError::NetworkDisabled {
                    section: "news",
                    source_name: "news_api",
                })
            }
            _ => {}
        }
        if self.news.max_articles == 0 {
            return Err(RunConfigError::Invalid {
                section: "news",
                message: "max_articles must be at least 1".into(),
            });
        }

        let recs = &self.recommendations;
        match recs.source {
            RecommendationSource::Scripted if recs.path.is_none() => {
                return Err(RunConfigError::MissingPath {
                    section: "recommendations",
                    source_name: "scripted",
                })
            }
            RecommendationSource::ChatCompletions if self.offline => {
                return Err(RunConfigError::NetworkDisabled {
                    section: "recommendations",
                    source_name: "chat_completions",
                })
            }
            _ => {}
        }
        if !(0.0..=2.0).contains(&recs.temperature) {
            return Err(RunConfigError::Invalid {
                section: "recommendations",
                message: format!("temperature must be in [0, 2], got {}", recs.temperature),
            });
        }
        if recs.max_tokens == 0 {
            return Err(RunConfigError::Invalid {
                section: "recommendations",
                message: "max_tokens must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradesim_core::BuySizing;

    const FULL: &str = r#"
[simulation]
symbols = ["AAPL", "MSFT"]
start_date = "2024-01-02"
end_date = "2024-03-29"
step_days = 7
initial_cash = 100000.0
provider_timeout_ms = 30000

[simulation.buy_sizing]
type = "FIXED_NOTIONAL"
amount = 5000.0

[prices]
source = "csv"
path = "prices.csv"
lookup = "exact"

[news]
source = "news_api"
max_articles = 3

[recommendations]
source = "chat_completions"
model = "gpt-4o-mini"

[output]
dir = "out"
"#;

    const MINIMAL: &str = r#"
[simulation]
symbols = ["SPY"]
start_date = "2024-01-02"
end_date = "2024-01-05"
initial_cash = 1000.0

[prices]
source = "synthetic"

[recommendations]
source = "scripted"
path = "recs.json"
"#;

    #[test]
    fn parses_full_file() {
        let run = RunFile::from_toml(FULL).unwrap();
        assert_eq!(run.simulation.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(run.simulation.step_days, 7);
        assert_eq!(
            run.simulation.buy_sizing,
            BuySizing::FixedNotional { amount: 5000.0 }
        );
        assert_eq!(run.simulation.provider_timeout_ms, Some(30_000));
        assert_eq!(run.prices.source, PriceSource::Csv);
        assert_eq!(run.prices.lookup, LookupMode::Exact);
        assert_eq!(run.prices.max_staleness_days, 5);
        assert_eq!(run.news.source, NewsSource::NewsApi);
        assert_eq!(run.news.max_articles, 3);
        assert_eq!(run.news.api_key_env, "NEWS_API_KEY");
        assert_eq!(run.recommendations.model, "gpt-4o-mini");
        assert_eq!(run.recommendations.temperature, 0.5);
        assert_eq!(run.recommendations.max_tokens, 150);
        assert_eq!(run.output.dir, PathBuf::from("out"));
        assert!(run.validate().is_ok());
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let run = RunFile::from_toml(MINIMAL).unwrap();
        assert_eq!(run.simulation.step_days, 1);
        assert_eq!(run.simulation.buy_sizing, BuySizing::default());
        assert_eq!(run.news.source, NewsSource::None);
        assert_eq!(run.prices.lookup, LookupMode::AsOf);
        assert_eq!(run.output.dir, PathBuf::from("results"));
        assert!(run.validate().is_ok());
    }

    #[test]
    fn paths_resolve_against_run_file_dir() {
        let mut run = RunFile::from_toml(FULL).unwrap();
        run.resolve_paths(Path::new("/data/runs"));
        assert_eq!(run.prices.path, Some(PathBuf::from("/data/runs/prices.csv")));
        assert_eq!(run.output.dir, PathBuf::from("/data/runs/out"));
    }

    #[test]
    fn missing_paths_are_reported() {
        let mut run = RunFile::from_toml(FULL).unwrap();
        run.prices.path = None;
        assert!(matches!(
            run.validate(),
            Err(RunConfigError::MissingPath { section: "prices", .. })
        ));

        let mut run = RunFile::from_toml(MINIMAL).unwrap();
        run.recommendations.path = None;
        assert!(matches!(
            run.validate(),
            Err(RunConfigError::MissingPath { section: "recommendations", .. })
        ));
    }

    #[test]
    fn offline_rejects_network_sources() {
        let mut run = RunFile::from_toml(FULL).unwrap();
        run.apply_overrides(&RunOverrides {
            offline: true,
            ..Default::default()
        });
        assert!(matches!(
            run.validate(),
            Err(RunConfigError::NetworkDisabled { section: "news", .. })
        ));

        let mut run = RunFile::from_toml(MINIMAL).unwrap();
        run.apply_overrides(&RunOverrides {
            offline: true,
            ..Default::default()
        });
        assert!(run.validate().is_ok());
    }

    #[test]
    fn overrides_replace_output_and_prices() {
        let mut run = RunFile::from_toml(FULL).unwrap();
        run.apply_overrides(&RunOverrides {
            output_dir: Some(PathBuf::from("/tmp/elsewhere")),
            synthetic_prices: true,
            offline: false,
        });
        assert_eq!(run.output.dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(run.prices.source, PriceSource::Synthetic);
    }

    #[test]
    fn invalid_simulation_settings_surface() {
        let bad = MINIMAL.replace("initial_cash = 1000.0", "initial_cash = 0.0");
        let run = RunFile::from_toml(&bad).unwrap();
        assert!(matches!(
            run.validate(),
            Err(RunConfigError::Simulation(ConfigError::NonPositiveCash(_)))
        ));

        let mut run = RunFile::from_toml(MINIMAL).unwrap();
        run.recommendations.temperature = 3.0;
        assert!(matches!(
            run.validate(),
            Err(RunConfigError::Invalid { section: "recommendations", .. })
        ));
    }

    #[test]
    fn unknown_source_fails_to_parse() {
        let bad = MINIMAL.replace("\"synthetic\"", "\"bloomberg\"");
        assert!(matches!(
            RunFile::from_toml(&bad),
            Err(RunConfigError::Parse(_))
        ));
    }
}
