//! tradesim CLI — run, check and inspect news-driven trading simulations.
//!
//! Commands:
//! - `run`: execute a simulation from a TOML run file and write artifacts
//! - `check`: validate a run file and show what a run would do
//! - `show`: print the summary of a saved run directory

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tradesim_runner::{
    format_summary, load_run, run_simulation, ArtifactManager, RunFile, RunOverrides,
};

#[derive(Parser)]
#[command(
    name = "tradesim",
    about = "Day-by-day trading simulation driven by news and model recommendations"
)]
struct Cli {
    /// Only log warnings and errors (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a TOML run file.
    Run {
        /// Path to the run file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts (overrides [output] dir).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Use synthetic prices instead of the configured source.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Offline mode: refuse every source that needs the network.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Print the summary without writing artifacts.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Validate a run file and print the planned run.
    Check {
        /// Path to the run file.
        #[arg(long)]
        config: PathBuf,

        /// Validate as if running offline.
        #[arg(long, default_value_t = false)]
        offline: bool,
    },
    /// Print the summary of a saved run.
    Show {
        /// Run directory containing result.json.
        dir: PathBuf,

        /// Also list every transaction.
        #[arg(long, default_value_t = false)]
        transactions: bool,

        /// Also list every warning.
        #[arg(long, default_value_t = false)]
        warnings: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            synthetic,
            offline,
            no_artifacts,
        } => run_cmd(
            &config,
            RunOverrides {
                output_dir,
                synthetic_prices: synthetic,
                offline,
            },
            no_artifacts,
        ),
        Commands::Check { config, offline } => check_cmd(&config, offline),
        Commands::Show {
            dir,
            transactions,
            warnings,
        } => show_cmd(&dir, transactions, warnings),
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn load_run_file(path: &Path, overrides: &RunOverrides) -> Result<RunFile> {
    let mut run = RunFile::from_file(path)
        .with_context(|| format!("failed to load run file {}", path.display()))?;
    run.apply_overrides(overrides);
    run.validate()?;
    Ok(run)
}

fn run_cmd(config: &Path, overrides: RunOverrides, no_artifacts: bool) -> Result<()> {
    let run = load_run_file(config, &overrides)?;
    info!(
        run_id = %run.simulation.run_id(),
        symbols = run.simulation.symbols.len(),
        "starting run"
    );
    let record = run_simulation(&run)?;

    print!("{}", format_summary(&record));

    if !no_artifacts {
        let manager = ArtifactManager::new(&run.output.dir)?;
        let paths = manager.save_run(&record)?;
        println!("Artifacts saved to: {}", paths.run_dir.display());
    }
    Ok(())
}

fn check_cmd(config: &Path, offline: bool) -> Result<()> {
    let run = load_run_file(
        config,
        &RunOverrides {
            offline,
            ..Default::default()
        },
    )?;
    let sim = &run.simulation;
    let dates = sim.simulated_dates();

    println!("Run file OK: {}", config.display());
    println!("  Run id:          {}", sim.run_id());
    println!("  Symbols:         {}", sim.symbols.join(", "));
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => println!(
            "  Simulated dates: {} ({first} to {last}, every {} day(s))",
            dates.len(),
            sim.step_days
        ),
        _ => println!("  Simulated dates: 0"),
    }
    println!("  Initial cash:    {:.2}", sim.initial_cash);
    println!("  Buy sizing:      {}", sim.buy_sizing.name());
    println!(
        "  Sources:         prices={}, news={}, recommendations={}",
        run.prices.source.as_str(),
        run.news.source.as_str(),
        run.recommendations.source.as_str()
    );
    println!("  Output dir:      {}", run.output.dir.display());
    Ok(())
}

fn show_cmd(dir: &Path, transactions: bool, warnings: bool) -> Result<()> {
    let record = load_run(dir)?;
    print!("{}", format_summary(&record));

    if transactions {
        println!("\nTransactions:");
        for tx in &record.result.transactions {
            println!(
                "  {} {:<4} {:<8} {:>10} @ {:>10.2}  cash {:>12.2}",
                tx.date,
                tx.action.to_string(),
                tx.symbol,
                tx.quantity,
                tx.price,
                tx.resulting_cash
            );
        }
    }
    if warnings {
        println!("\nWarnings:");
        for w in &record.result.warnings {
            println!("  {} {:<8} {:<24} {}", w.date, w.symbol, w.kind.as_str(), w.message);
        }
    }
    Ok(())
}
