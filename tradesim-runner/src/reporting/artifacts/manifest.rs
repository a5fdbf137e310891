//! Run manifest export (JSON).

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::result::{RunRecord, SourceNames};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub schema_version: u32,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub symbols: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub step_days: u32,
    pub days_simulated: usize,
    pub initial_cash: f64,
    pub final_cash: f64,
    pub final_value: f64,
    pub return_pct: f64,
    pub trade_count: usize,
    pub warning_count: usize,
    pub sources: SourceNames,
    pub has_synthetic: bool,
    pub dataset_hash: Option<String>,
}

impl RunManifest {
    pub fn from_record(record: &RunRecord) -> Self {
        let r = &record.result;
        Self {
            run_id: r.run_id.clone(),
            schema_version: record.schema_version,
            timestamp: record.metadata.timestamp,
            duration_secs: record.metadata.duration_secs,
            symbols: r.config.symbols.clone(),
            start_date: r.config.start_date,
            end_date: r.config.end_date,
            step_days: r.config.step_days,
            days_simulated: r.days_simulated,
            initial_cash: r.initial_cash,
            final_cash: r.final_cash,
            final_value: r.final_value,
            return_pct: r.return_pct(),
            trade_count: record.trade_count(),
            warning_count: record.warning_count(),
            sources: record.sources.clone(),
            has_synthetic: record.has_synthetic,
            dataset_hash: record.dataset_hash.clone(),
        }
    }
}

pub fn write_manifest(path: &Path, record: &RunRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(&RunManifest::from_record(record))
        .context("failed to serialize run manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write manifest to {}", path.display()))?;
    Ok(())
}
