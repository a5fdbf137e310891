//! Artifact manager for persisting run outputs.
//!
//! Each run gets `{output_dir}/{run_id}/` with:
//! - `result.json`: the full schema-versioned record
//! - `manifest.json`: headline numbers and provenance
//! - `valuation.csv` / `valuation.parquet`: one row per simulated day
//! - `transactions.csv`: the trade log
//! - `warnings.csv`: every degraded symbol/day

mod ledger;
mod manifest;
mod valuation;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::export::{export_json, RESULT_FILE};
use crate::result::RunRecord;

pub use manifest::RunManifest;

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub result_json: PathBuf,
    pub manifest: PathBuf,
    pub valuation_csv: PathBuf,
    pub valuation_parquet: PathBuf,
    pub transactions_csv: PathBuf,
    pub warnings_csv: PathBuf,
}

/// Writes all artifacts for a run under one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!("failed to create output directory {}", output_dir.display())
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the full artifact set. Re-running an identical config overwrites
    /// the same directory.
    pub fn save_run(&self, record: &RunRecord) -> Result<ArtifactPaths> {
        let run_dir = self.output_dir.join(record.run_id());
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("failed to create run directory {}", run_dir.display()))?;

        let result_json = run_dir.join(RESULT_FILE);
        std::fs::write(&result_json, export_json(record)?)
            .with_context(|| format!("failed to write {}", result_json.display()))?;

        let manifest = run_dir.join("manifest.json");
        manifest::write_manifest(&manifest, record)?;

        let valuation_csv = run_dir.join("valuation.csv");
        let valuation_parquet = run_dir.join("valuation.parquet");
        valuation::write_valuation_csv(&valuation_csv, &record.result.days)?;
        valuation::write_valuation_parquet(&valuation_parquet, &record.result.days)?;

        let transactions_csv = run_dir.join("transactions.csv");
        ledger::write_transactions_csv(&transactions_csv, &record.result.transactions)?;

        let warnings_csv = run_dir.join("warnings.csv");
        ledger::write_warnings_csv(&warnings_csv, &record.result.warnings)?;

        tracing::info!(dir = %run_dir.display(), "artifacts written");
        Ok(ArtifactPaths {
            run_dir,
            result_json,
            manifest,
            valuation_csv,
            valuation_parquet,
            transactions_csv,
            warnings_csv,
        })
    }
}
