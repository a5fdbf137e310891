//! Persisted record of one simulation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tradesim_core::SimulationResult;

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Names of the collaborators a run used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNames {
    pub prices: String,
    pub news: String,
    pub recommendations: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
}

/// Simulation result plus provenance, as written to `result.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub result: SimulationResult,
    pub sources: SourceNames,
    /// True when prices came from the synthetic generator.
    pub has_synthetic: bool,
    /// BLAKE3 of the loaded price table, when prices were preloaded.
    #[serde(default)]
    pub dataset_hash: Option<String>,
    pub metadata: RunMetadata,
}

impl RunRecord {
    pub fn run_id(&self) -> &str {
        &self.result.run_id
    }

    pub fn trade_count(&self) -> usize {
        self.result.transactions.len()
    }

    pub fn warning_count(&self) -> usize {
        self.result.warnings.len()
    }
}
