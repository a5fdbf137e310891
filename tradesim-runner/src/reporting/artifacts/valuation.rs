//! Daily valuation export (CSV/Parquet).

use anyhow::{Context, Result};
use polars::prelude::{Column, DataFrame, NamedFrom, ParquetWriter, Series};
use std::fs::File;
use std::path::Path;
use tradesim_core::engine::DayReport;

pub fn write_valuation_csv(path: &Path, days: &[DayReport]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create valuation CSV {}", path.display()))?;
    wtr.write_record(["date", "total_value", "cash", "trades"])?;
    for day in days {
        wtr.write_record([
            day.date.to_string(),
            format!("{:.4}", day.total_value),
            format!("{:.4}", day.cash),
            day.trade_count().to_string(),
        ])?;
    }
    wtr.flush().context("failed to flush valuation CSV")?;
    Ok(())
}

pub fn write_valuation_parquet(path: &Path, days: &[DayReport]) -> Result<()> {
    let dates: Vec<String> = days.iter().map(|d| d.date.to_string()).collect();
    let values: Vec<f64> = days.iter().map(|d| d.total_value).collect();
    let cash: Vec<f64> = days.iter().map(|d| d.cash).collect();
    let trades: Vec<u32> = days.iter().map(|d| d.trade_count() as u32).collect();

    let mut df = DataFrame::new(vec![
        Column::Series(Series::new("date".into(), dates).into()),
        Column::Series(Series::new("total_value".into(), values).into()),
        Column::Series(Series::new("cash".into(), cash).into()),
        Column::Series(Series::new("trades".into(), trades).into()),
    ])
    .context("failed to build valuation dataframe")?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create valuation parquet {}", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .context("failed to write valuation parquet")?;
    Ok(())
}
