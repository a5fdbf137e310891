//! Historical price table and the price provider built on it.
//!
//! Prices are loaded once before the run (CSV file, synthetic random walk or
//! Yahoo download) and then served from memory. Lookup is either exact-date
//! or as-of: the most recent close at or before the requested date, no older
//! than `max_staleness_days`. As-of lookup lets weekend and holiday dates
//! trade at the previous close.

use super::yahoo::YahooClient;
use super::{read_file, LoadError};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};
use tradesim_core::{PriceProvider, ProviderError};

/// How a date without its own close is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    /// Most recent close at or before the date.
    #[default]
    AsOf,
    /// Only a close dated exactly on the date.
    Exact,
}

/// Closing prices per symbol, ordered by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    series: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    symbol: String,
    close: f64,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one close. Non-positive and non-finite closes are ignored.
    pub fn insert(&mut self, symbol: &str, date: NaiveDate, close: f64) -> bool {
        if !(close.is_finite() && close > 0.0) {
            return false;
        }
        self.series
            .entry(symbol.to_string())
            .or_default()
            .insert(date, close);
        true
    }

    pub fn series(&self, symbol: &str) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.series.get(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|s| s.as_str())
    }

    /// Total number of closes across all symbols.
    pub fn len(&self) -> usize {
        self.series.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load `date,symbol,close` rows from a CSV file with a header line.
    pub fn from_csv_path(path: &Path) -> Result<Self, LoadError> {
        let content = read_file(path)?;
        Self::from_csv_reader(content.as_bytes(), path)
    }

    pub fn from_csv_reader<R: Read>(reader: R, path: &Path) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut table = Self::new();
        for (i, row) in rdr.deserialize::<PriceRow>().enumerate() {
            let row = row.map_err(|source| LoadError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            if row.symbol.is_empty() {
                return Err(LoadError::InvalidRow {
                    path: path.to_path_buf(),
                    reason: format!("row {}: empty symbol", i + 1),
                });
            }
            if !table.insert(&row.symbol, row.date, row.close) {
                return Err(LoadError::InvalidRow {
                    path: path.to_path_buf(),
                    reason: format!(
                        "row {}: close {} for {} on {} must be > 0",
                        i + 1,
                        row.close,
                        row.symbol,
                        row.date
                    ),
                });
            }
        }
        info!(path = %path.display(), closes = table.len(), "loaded price CSV");
        Ok(table)
    }

    /// Deterministic random-walk closes for offline runs.
    ///
    /// Each symbol starts at 100.0 and moves up to ±3% per weekday; the RNG
    /// is seeded from the symbol name, so a symbol always gets the same path.
    pub fn synthetic(symbols: &[String], start: NaiveDate, end: NaiveDate) -> Self {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut table = Self::new();
        for symbol in symbols {
            let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
            let mut rng = StdRng::from_seed(seed);
            let mut price = 100.0_f64;
            let mut current = start;
            while current <= end {
                if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                    let daily_return: f64 = rng.gen_range(-0.03..0.03);
                    price *= 1.0 + daily_return;
                    table.insert(symbol, current, price);
                }
                match current.succ_opt() {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
        warn!(symbols = symbols.len(), "using synthetic prices; results are not market data");
        table
    }

    /// Download daily closes from Yahoo. Symbols that fail are left out and
    /// will be reported as unavailable by the engine.
    pub fn from_yahoo(
        client: &YahooClient,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        let mut table = Self::new();
        for symbol in symbols {
            match client.daily_closes(symbol, start, end) {
                Ok(closes) => {
                    info!(symbol, closes = closes.len(), "downloaded prices");
                    for (date, close) in closes {
                        table.insert(symbol, date, close);
                    }
                }
                Err(e) => warn!(symbol, error = %e, "price download failed"),
            }
        }
        table
    }

    /// BLAKE3 over every close in symbol/date order.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (symbol, series) in &self.series {
            hasher.update(symbol.as_bytes());
            for (date, close) in series {
                hasher.update(date.to_string().as_bytes());
                hasher.update(&close.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// [`PriceProvider`] over an in-memory [`PriceTable`].
#[derive(Debug, Clone)]
pub struct HistoricalPrices {
    name: String,
    table: PriceTable,
    lookup: LookupMode,
    max_staleness_days: u32,
}

impl HistoricalPrices {
    pub fn new(
        name: impl Into<String>,
        table: PriceTable,
        lookup: LookupMode,
        max_staleness_days: u32,
    ) -> Self {
        Self {
            name: name.into(),
            table,
            lookup,
            max_staleness_days,
        }
    }

    pub fn table(&self) -> &PriceTable {
        &self.table
    }

    /// The close used for `date` and the date it was recorded on.
    pub fn lookup(&self, symbol: &str, date: NaiveDate) -> Option<(NaiveDate, f64)> {
        let series = self.table.series(symbol)?;
        match self.lookup {
            LookupMode::Exact => series.get(&date).map(|close| (date, *close)),
            LookupMode::AsOf => series
                .range(..=date)
                .next_back()
                .filter(|(d, _)| (date - **d).num_days() <= i64::from(self.max_staleness_days))
                .map(|(d, close)| (*d, *close)),
        }
    }
}

impl PriceProvider for HistoricalPrices {
    fn name(&self) -> &str {
        &self.name
    }

    fn price(&self, symbol: &str, date: NaiveDate) -> Result<f64, ProviderError> {
        self.lookup(symbol, date)
            .map(|(_, close)| close)
            .ok_or_else(|| ProviderError::Unavailable {
                symbol: symbol.to_string(),
                date,
            })
    }
}
