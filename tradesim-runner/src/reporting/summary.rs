//! Plain-text run summary for the terminal.

use std::fmt::Write;

use tradesim_core::engine::WarningKind;

use crate::result::RunRecord;

pub fn format_summary(record: &RunRecord) -> String {
    let r = &record.result;
    let mut out = String::with_capacity(1024);

    let _ = writeln!(out, "Run {}", record.run_id());
    let _ = writeln!(
        out,
        "  Period:        {} to {} (every {} day(s), {} simulated)",
        r.config.start_date, r.config.end_date, r.config.step_days, r.days_simulated
    );
    let _ = writeln!(out, "  Symbols:       {}", r.config.symbols.join(", "));
    let _ = writeln!(
        out,
        "  Sources:       prices={}, news={}, recommendations={}",
        record.sources.prices, record.sources.news, record.sources.recommendations
    );
    if record.has_synthetic {
        let _ = writeln!(out, "  Data:          SYNTHETIC");
    }
    let _ = writeln!(out, "  Initial cash:  {:.2}", r.initial_cash);
    let _ = writeln!(out, "  Final cash:    {:.2}", r.final_cash);
    let _ = writeln!(out, "  Final value:   {:.2}", r.final_value);
    let _ = writeln!(out, "  Return:        {:+.2}%", r.return_pct());
    let _ = writeln!(out, "  Trades:        {}", record.trade_count());

    if !r.holdings.is_empty() {
        let _ = writeln!(out, "  Holdings:");
        for (symbol, qty) in r.holdings.iter() {
            let _ = writeln!(out, "    {symbol:<8} {qty}");
        }
    }

    let _ = writeln!(out, "  Warnings:      {}", record.warning_count());
    for kind in [
        WarningKind::PriceUnavailable,
        WarningKind::NewsFailed,
        WarningKind::RecommendationFailed,
        WarningKind::MalformedRecommendation,
        WarningKind::TradeRejected,
    ] {
        let count = r.warnings.iter().filter(|w| w.kind == kind).count();
        if count > 0 {
            let _ = writeln!(out, "    {:<26} {count}", kind.as_str());
        }
    }
    out
}
