//! JSON round-trip of run records with schema versioning.
//!
//! Records written by a newer schema are rejected on load.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::result::{RunRecord, SCHEMA_VERSION};

/// File name of the full record inside a run directory.
pub const RESULT_FILE: &str = "result.json";

pub fn export_json(record: &RunRecord) -> Result<String> {
    serde_json::to_string_pretty(record).context("failed to serialize run record to JSON")
}

pub fn import_json(json: &str) -> Result<RunRecord> {
    let record: RunRecord =
        serde_json::from_str(json).context("failed to deserialize run record from JSON")?;
    if record.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            record.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(record)
}

/// Load the record from a run directory's `result.json`.
pub fn load_run(dir: &Path) -> Result<RunRecord> {
    let path = dir.join(RESULT_FILE);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
