//! Transaction log and warning export (CSV).
//!
//! Warning messages carry provider error text, so these go through the csv
//! writer for quoting.

use anyhow::{Context, Result};
use std::path::Path;
use tradesim_core::domain::Transaction;
use tradesim_core::engine::SimulationWarning;

pub fn write_transactions_csv(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create transactions CSV {}", path.display()))?;
    wtr.write_record([
        "date",
        "symbol",
        "action",
        "price",
        "quantity",
        "notional",
        "resulting_cash",
    ])?;
    for tx in transactions {
        wtr.write_record([
            tx.date.to_string(),
            tx.symbol.clone(),
            tx.action.to_string(),
            format!("{:.4}", tx.price),
            tx.quantity.to_string(),
            format!("{:.4}", tx.notional()),
            format!("{:.4}", tx.resulting_cash),
        ])?;
    }
    wtr.flush().context("failed to flush transactions CSV")?;
    Ok(())
}

pub fn write_warnings_csv(path: &Path, warnings: &[SimulationWarning]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create warnings CSV {}", path.display()))?;
    wtr.write_record(["date", "symbol", "kind", "message"])?;
    for w in warnings {
        wtr.write_record([
            w.date.to_string().as_str(),
            w.symbol.as_str(),
            w.kind.as_str(),
            w.message.as_str(),
        ])?;
    }
    wtr.flush().context("failed to flush warnings CSV")?;
    Ok(())
}
