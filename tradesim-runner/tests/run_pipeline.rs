//! End-to-end runner tests: run file → collaborators → engine → artifacts.

use std::fs;
use std::path::Path;

use tradesim_core::domain::TradeAction;
use tradesim_core::engine::WarningKind;
use tradesim_runner::config::{PriceSource, RecommendationSource};
use tradesim_runner::reporting::{import_json, export_json};
use tradesim_runner::runner::build_collaborators_with_env;
use tradesim_runner::{
    format_summary, load_run, run_simulation, ArtifactManager, RunError, RunFile, RunOverrides,
};

// ── Fixtures ─────────────────────────────────────────────────────────

const PRICES: &str = "\
date,symbol,close
2024-01-01,AAPL,100
2024-01-02,AAPL,101
2024-01-03,AAPL,102
2024-01-04,AAPL,103
2024-01-05,AAPL,104
2024-01-03,MSFT,50
2024-01-04,MSFT,51
2024-01-05,MSFT,52
";

const RECS: &str = r#"[
    {"symbol":"AAPL","date":"2024-01-01","action":"BUY","quantity":10},
    {"symbol":"MSFT","date":"2024-01-03","action":"BUY","limit_price":40.0},
    {"symbol":"AAPL","date":"2024-01-04","action":"SELL"}
]"#;

const NEWS: &str = r#"[
    {"symbol":"AAPL","date":"2024-01-01","title":"Apple rallies","summary":"Strong demand"}
]"#;

const RUN: &str = r#"
[simulation]
symbols = ["AAPL", "MSFT"]
start_date = "2024-01-01"
end_date = "2024-01-05"
initial_cash = 10000.0

[prices]
source = "csv"
path = "prices.csv"

[news]
source = "file"
path = "news.json"

[recommendations]
source = "scripted"
path = "recs.json"

[output]
dir = "results"
"#;

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    fs::write(dir.join("prices.csv"), PRICES).unwrap();
    fs::write(dir.join("recs.json"), RECS).unwrap();
    fs::write(dir.join("news.json"), NEWS).unwrap();
    let run = dir.join("run.toml");
    fs::write(&run, RUN).unwrap();
    run
}

// ── Runs ─────────────────────────────────────────────────────────────

#[test]
fn scripted_run_trades_and_degrades_as_expected() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunFile::from_file(&write_fixture(tmp.path())).unwrap();
    assert_eq!(run.output.dir, tmp.path().join("results"));

    let record = run_simulation(&run).unwrap();
    let result = &record.result;

    // GIVEN AAPL bought 10 @ 100 on day 1 and sold @ 103 on day 4
    assert_eq!(result.transactions.len(), 2);
    assert_eq!(result.transactions[0].action, TradeAction::Buy);
    assert_eq!(result.transactions[0].quantity, 10.0);
    assert_eq!(result.transactions[1].action, TradeAction::Sell);
    assert_eq!(result.transactions[1].quantity, 10.0);
    assert_eq!(result.final_cash, 10_030.0);
    assert_eq!(result.final_value, 10_030.0);
    assert!(result.holdings.is_empty());

    // THEN MSFT has no price on the first two days, and its limited BUY is held
    assert_eq!(result.warnings.len(), 2);
    assert!(result
        .warnings
        .iter()
        .all(|w| w.symbol == "MSFT" && w.kind == WarningKind::PriceUnavailable));

    assert_eq!(result.valuation_history.len(), 5);
    assert_eq!(result.valuation_history[1].total_value, 10_010.0);
    assert_eq!(result.days[0].outcomes[0].article_count, 1);
    assert_eq!(result.days[1].outcomes[0].article_count, 0);

    assert_eq!(record.sources.prices, "csv");
    assert_eq!(record.sources.news, "file");
    assert_eq!(record.sources.recommendations, "scripted");
    assert!(!record.has_synthetic);
    assert!(record.dataset_hash.is_some());
}

#[test]
fn artifacts_are_written_and_reloadable() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunFile::from_file(&write_fixture(tmp.path())).unwrap();
    let record = run_simulation(&run).unwrap();

    let manager = ArtifactManager::new(&run.output.dir).unwrap();
    let paths = manager.save_run(&record).unwrap();

    assert_eq!(paths.run_dir, run.output.dir.join(record.run_id()));
    for path in [
        &paths.result_json,
        &paths.manifest,
        &paths.valuation_csv,
        &paths.valuation_parquet,
        &paths.transactions_csv,
        &paths.warnings_csv,
    ] {
        assert!(path.exists(), "missing {}", path.display());
    }

    let valuation = fs::read_to_string(&paths.valuation_csv).unwrap();
    assert_eq!(valuation.lines().count(), 6);
    assert!(valuation.starts_with("date,total_value,cash,trades\n2024-01-01,"));

    let transactions = fs::read_to_string(&paths.transactions_csv).unwrap();
    assert_eq!(transactions.lines().count(), 3);
    assert!(transactions.contains("2024-01-01,AAPL,BUY,100.0000,10,"));

    let warnings = fs::read_to_string(&paths.warnings_csv).unwrap();
    assert_eq!(warnings.lines().count(), 3);
    assert!(warnings.contains("price_unavailable"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&paths.manifest).unwrap()).unwrap();
    assert_eq!(manifest["trade_count"], 2);
    assert_eq!(manifest["warning_count"], 2);
    assert_eq!(manifest["run_id"], record.run_id());

    let reloaded = load_run(&paths.run_dir).unwrap();
    assert_eq!(reloaded, record);
    assert!(format_summary(&reloaded).contains("Trades:        2"));
}

#[test]
fn newer_schema_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunFile::from_file(&write_fixture(tmp.path())).unwrap();
    let mut record = run_simulation(&run).unwrap();
    record.schema_version = tradesim_runner::SCHEMA_VERSION + 1;
    let json = export_json(&record).unwrap();
    let err = import_json(&json).unwrap_err();
    assert!(err.to_string().contains("unsupported schema version"));
}

#[test]
fn identical_runs_share_id_and_results() {
    let tmp = tempfile::tempdir().unwrap();
    let run = RunFile::from_file(&write_fixture(tmp.path())).unwrap();
    let a = run_simulation(&run).unwrap();
    let b = run_simulation(&run).unwrap();
    assert_eq!(a.run_id(), b.run_id());
    assert_eq!(a.result, b.result);
}

#[test]
fn synthetic_override_runs_offline() {
    let tmp = tempfile::tempdir().unwrap();
    let mut run = RunFile::from_file(&write_fixture(tmp.path())).unwrap();
    run.apply_overrides(&RunOverrides {
        synthetic_prices: true,
        offline: true,
        ..Default::default()
    });
    assert_eq!(run.prices.source, PriceSource::Synthetic);

    let record = run_simulation(&run).unwrap();
    assert!(record.has_synthetic);
    assert_eq!(record.sources.prices, "synthetic");
    // 2024-01-01 is a Monday, so every day of the week has a close.
    assert!(record.result.warnings.is_empty());
    assert_eq!(record.result.valuation_history.len(), 5);
    assert!(record.result.final_value > 0.0);
}

#[test]
fn chat_completions_without_key_fails_before_running() {
    let tmp = tempfile::tempdir().unwrap();
    let mut run = RunFile::from_file(&write_fixture(tmp.path())).unwrap();
    run.recommendations.source = RecommendationSource::ChatCompletions;
    run.recommendations.api_key_env = "TRADESIM_TEST_UNSET_KEY".into();

    let err = build_collaborators_with_env(&run, |_| None).err().unwrap();
    assert!(matches!(err, RunError::MissingApiKey { ref var, .. } if var == "TRADESIM_TEST_UNSET_KEY"));

    // A blank value counts as missing too.
    let err = build_collaborators_with_env(&run, |_| Some("  ".into())).err().unwrap();
    assert!(matches!(err, RunError::MissingApiKey { .. }));
}

#[test]
fn missing_price_file_is_a_data_error() {
    let tmp = tempfile::tempdir().unwrap();
    let run_path = write_fixture(tmp.path());
    fs::remove_file(tmp.path().join("prices.csv")).unwrap();
    let run = RunFile::from_file(&run_path).unwrap();
    assert!(matches!(run_simulation(&run), Err(RunError::Data(_))));
}

#[test]
fn invalid_run_file_is_rejected_on_load() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad.toml");
    fs::write(&path, RUN.replace("2024-01-05", "2023-12-01")).unwrap();
    assert!(RunFile::from_file(&path).is_err());
}
