//! tradesim runner — run files, adapters and artifact export.
//!
//! This crate builds on `tradesim-core` to provide:
//! - TOML run files with source selection and CLI overrides
//! - Price sources: CSV, synthetic random walk, Yahoo Finance
//! - News sources: NewsAPI, JSON article files
//! - Recommendation engines: chat-completions, scripted replay
//! - Result records and the artifact bundle (JSON, CSV, Parquet)

pub mod adapters;
pub mod config;
pub mod reporting;
pub mod result;
pub mod runner;

pub use config::{RunConfigError, RunFile, RunOverrides};
pub use reporting::{format_summary, load_run, ArtifactManager, ArtifactPaths};
pub use result::{RunRecord, SCHEMA_VERSION};
pub use runner::{
    build_collaborators, run_simulation, run_with_collaborators, Collaborators, RunError,
};
