//! Criterion benchmarks for tradesim hot paths.
//!
//! Benchmarks:
//! 1. Full simulation run (sequential and parallel gather)
//! 2. Portfolio valuation over many positions
//! 3. Decision policy

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashMap;
use std::sync::Arc;

use tradesim_core::{
    decide, BuySizing, DecisionInput, NoNews, Portfolio, PriceProvider, ProviderError,
    RawRecommendation, RecommendationEngine, RecommendationRequest, SimulationConfig,
    SimulationEngine,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// Deterministic oscillating prices, no I/O.
struct WavePrices;

impl PriceProvider for WavePrices {
    fn name(&self) -> &str {
        "wave"
    }

    fn price(&self, symbol: &str, date: NaiveDate) -> Result<f64, ProviderError> {
        let offset = (date - base_date()).num_days() as f64;
        let phase = symbol.len() as f64;
        Ok(100.0 + ((offset + phase) * 0.1).sin() * 10.0)
    }
}

/// Buys on the way down, sells on the way up.
struct Contrarian;

impl RecommendationEngine for Contrarian {
    fn name(&self) -> &str {
        "contrarian"
    }

    fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RawRecommendation, ProviderError> {
        let action = if request.price < 97.0 {
            "BUY"
        } else if request.price > 103.0 {
            "SELL"
        } else {
            "HOLD"
        };
        Ok(RawRecommendation::action(action))
    }
}

fn symbols(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("SYM{i:03}")).collect()
}

fn make_engine(n_symbols: usize, days: u64, parallel: bool) -> SimulationEngine {
    let end = base_date() + chrono::Days::new(days - 1);
    let config = SimulationConfig::new(symbols(n_symbols), base_date(), end, 1_000_000.0)
        .with_sizing(BuySizing::FixedFraction { fraction: 0.05 })
        .with_parallel_fetch(parallel)
        .without_timeout();
    SimulationEngine::new(
        config,
        Arc::new(WavePrices),
        Arc::new(NoNews),
        Arc::new(Contrarian),
    )
    .unwrap()
}

// ── 1. Full run ──────────────────────────────────────────────────────

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_run");
    for n in [1usize, 10, 50] {
        group.bench_with_input(BenchmarkId::new("sequential", n), &n, |b, &n| {
            b.iter(|| black_box(make_engine(n, 252, false).run().unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("parallel", n), &n, |b, &n| {
            b.iter(|| black_box(make_engine(n, 252, true).run().unwrap()))
        });
    }
    group.finish();
}

// ── 2. Valuation ─────────────────────────────────────────────────────

fn bench_valuation(c: &mut Criterion) {
    let mut portfolio = Portfolio::new(10_000_000.0);
    let mut prices = HashMap::new();
    for (i, sym) in symbols(500).iter().enumerate() {
        let price = 10.0 + i as f64;
        portfolio.buy(sym, price, 10.0, base_date()).unwrap();
        if i % 3 != 0 {
            prices.insert(sym.clone(), price * 1.01);
        }
    }
    c.bench_function("value_at_500_positions", |b| {
        b.iter(|| black_box(portfolio.value_at(black_box(&prices))))
    });
}

// ── 3. Decision ──────────────────────────────────────────────────────

fn bench_decide(c: &mut Criterion) {
    let sizing = BuySizing::default();
    let outcome = Ok(RawRecommendation::action("buy").with_limit(120.0));
    c.bench_function("decide_buy", |b| {
        b.iter(|| {
            black_box(decide(DecisionInput {
                outcome: black_box(&outcome),
                price: 101.5,
                held: 0.0,
                cash: 50_000.0,
                sizing: &sizing,
            }))
        })
    });
}

criterion_group!(benches, bench_run, bench_valuation, bench_decide);
criterion_main!(benches);
