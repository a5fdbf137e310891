//! Replayable recommendations from a JSON file.
//!
//! The file is an array of `{symbol, date, action, limit_price?, quantity?,
//! confidence?, rationale?}`. Symbol/day pairs without an entry get HOLD, so a
//! script only lists the days something happens.

use super::{read_file, LoadError};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tradesim_core::{ProviderError, RawRecommendation, RecommendationEngine, RecommendationRequest};

#[derive(Debug, Deserialize)]
struct ScriptEntry {
    symbol: String,
    date: NaiveDate,
    #[serde(flatten)]
    recommendation: RawRecommendation,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    entries: HashMap<(String, NaiveDate), RawRecommendation>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the recommendation for one symbol and day.
    pub fn with(mut self, symbol: &str, date: NaiveDate, recommendation: RawRecommendation) -> Self {
        self.entries.insert((symbol.to_string(), date), recommendation);
        self
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let content = read_file(path)?;
        Self::from_json(&content, path)
    }

    /// Later entries for the same symbol/day replace earlier ones.
    pub fn from_json(json: &str, path: &Path) -> Result<Self, LoadError> {
        let entries: Vec<ScriptEntry> =
            serde_json::from_str(json).map_err(|source| LoadError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            entries: entries
                .into_iter()
                .map(|e| ((e.symbol, e.date), e.recommendation))
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RecommendationEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RawRecommendation, ProviderError> {
        Ok(self
            .entries
            .get(&(request.symbol.clone(), request.date))
            .cloned()
            .unwrap_or_else(|| RawRecommendation::action("HOLD")))
    }
}
