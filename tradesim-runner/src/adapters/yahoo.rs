//! Yahoo Finance daily closes.
//!
//! Uses Yahoo's v8 chart API. Yahoo has no official API and changes its
//! format without notice; the CSV price source is the fallback.

use super::circuit_breaker::CircuitBreaker;
use super::http::{build_client, send_with_retry, RetryPolicy};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tradesim_core::ProviderError;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

pub struct YahooClient {
    client: reqwest::blocking::Client,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
}

impl YahooClient {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
            breaker,
            retry: RetryPolicy::default(),
        })
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map_or(start_ts, |dt| dt.and_utc().timestamp());
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Daily closes for `symbol` between `start` and `end`, oldest first.
    pub fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, ProviderError> {
        let url = Self::chart_url(symbol, start, end);
        let resp = send_with_retry(&self.breaker, &self.retry, symbol, || {
            self.client.get(&url).send()
        })?;
        let chart: ChartResponse = resp.json().map_err(|e| {
            ProviderError::MalformedResponse(format!("chart response for {symbol}: {e}"))
        })?;
        parse_chart(symbol, chart)
    }
}

fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<(NaiveDate, f64)>, ProviderError> {
    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => ProviderError::Other(format!("symbol not found: {symbol}")),
        Some(err) => ProviderError::MalformedResponse(format!("{}: {}", err.code, err.description)),
        None => ProviderError::MalformedResponse("empty result with no error".into()),
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("result array is empty".into()))?;
    let timestamps = data
        .timestamp
        .ok_or_else(|| ProviderError::MalformedResponse("no timestamps".into()))?;
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("no quote data".into()))?;

    let mut closes = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ProviderError::MalformedResponse(format!("invalid timestamp: {ts}")))?;
        // Holidays come back as nulls.
        if let Some(close) = quote.close.get(i).copied().flatten() {
            closes.push((date, close));
        }
    }
    Ok(closes)
}
