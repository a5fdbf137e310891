//! Reporting and artifact export pipeline.

pub mod artifacts;
pub mod export;
pub mod summary;

pub use artifacts::{ArtifactManager, ArtifactPaths, RunManifest};
pub use export::{export_json, import_json, load_run};
pub use summary::format_summary;
