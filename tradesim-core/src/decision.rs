//! Decision policy — turns a recommendation outcome into a portfolio action.
//!
//! `decide` is a pure function of its inputs. Collaborator failures arrive as
//! values and resolve to `Decision::Hold` with a reason, so the engine loop
//! never branches on error paths itself.

use crate::domain::{Action, RawRecommendation};
use crate::providers::ProviderError;
use crate::sizing::BuySizing;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inputs to one decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    pub outcome: &'a Result<RawRecommendation, ProviderError>,
    pub price: f64,
    pub held: f64,
    pub cash: f64,
    pub sizing: &'a BuySizing,
}

/// What the engine should do for one symbol on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Buy { quantity: f64 },
    Sell { quantity: f64 },
    Hold { reason: HoldReason },
}

/// Why a symbol was held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum HoldReason {
    /// The recommendation itself was HOLD.
    Recommended,
    /// BUY with a limit below the current price.
    AboveBuyLimit { price: f64, limit: f64 },
    /// SELL with a limit above the current price.
    BelowSellLimit { price: f64, limit: f64 },
    /// BUY, but not even one share is affordable.
    Unaffordable,
    /// SELL, but nothing is held.
    NothingToSell,
    /// Quantity hint rounds down to zero whole shares.
    FractionalHint { quantity: f64 },
    /// No price for the symbol today.
    PriceUnavailable(String),
    /// Article fetch failed.
    NewsFailed(String),
    /// Recommendation call failed or timed out.
    EngineError(String),
    /// Recommendation failed validation.
    Malformed(String),
    /// The portfolio rejected the trade.
    Rejected(String),
}

impl HoldReason {
    /// True when the hold was forced by a failure rather than chosen.
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            HoldReason::PriceUnavailable(_)
                | HoldReason::NewsFailed(_)
                | HoldReason::EngineError(_)
                | HoldReason::Malformed(_)
                | HoldReason::Rejected(_)
        )
    }
}

impl fmt::Display for HoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldReason::Recommended => write!(f, "recommended HOLD"),
            HoldReason::AboveBuyLimit { price, limit } => {
                write!(f, "price {price:.2} above buy limit {limit:.2}")
            }
            HoldReason::BelowSellLimit { price, limit } => {
                write!(f, "price {price:.2} below sell limit {limit:.2}")
            }
            HoldReason::Unaffordable => write!(f, "cannot afford a single share"),
            HoldReason::NothingToSell => write!(f, "no shares held to sell"),
            HoldReason::FractionalHint { quantity } => {
                write!(f, "quantity hint {quantity} is less than one whole share")
            }
            HoldReason::PriceUnavailable(e) => write!(f, "price unavailable: {e}"),
            HoldReason::NewsFailed(e) => write!(f, "news fetch failed: {e}"),
            HoldReason::EngineError(e) => write!(f, "recommendation failed: {e}"),
            HoldReason::Malformed(e) => write!(f, "malformed recommendation: {e}"),
            HoldReason::Rejected(e) => write!(f, "trade rejected: {e}"),
        }
    }
}

/// Apply the trading rules to one recommendation outcome.
pub fn decide(input: DecisionInput<'_>) -> Decision {
    let raw = match input.outcome {
        Ok(raw) => raw,
        Err(e) => return hold(HoldReason::EngineError(e.to_string())),
    };
    let rec = match raw.validate() {
        Ok(rec) => rec,
        Err(e) => return hold(HoldReason::Malformed(e.to_string())),
    };

    match rec.action {
        Action::Hold => hold(HoldReason::Recommended),
        Action::Buy => {
            if let Some(limit) = rec.limit_price {
                if input.price > limit {
                    return hold(HoldReason::AboveBuyLimit {
                        price: input.price,
                        limit,
                    });
                }
            }
            if let Some(hint) = rec.quantity.filter(|q| *q < 1.0) {
                return hold(HoldReason::FractionalHint { quantity: hint });
            }
            let quantity = input.sizing.quantity(input.cash, input.price, rec.quantity);
            if quantity > 0.0 {
                Decision::Buy { quantity }
            } else {
                hold(HoldReason::Unaffordable)
            }
        }
        Action::Sell => {
            if input.held <= 0.0 {
                return hold(HoldReason::NothingToSell);
            }
            if let Some(limit) = rec.limit_price {
                if input.price < limit {
                    return hold(HoldReason::BelowSellLimit {
                        price: input.price,
                        limit,
                    });
                }
            }
            // Hints trade whole shares, as buys do.
            let quantity = match rec.quantity {
                Some(hint) if hint < 1.0 => {
                    return hold(HoldReason::FractionalHint { quantity: hint })
                }
                Some(hint) => hint.floor().min(input.held),
                None => input.held,
            };
            Decision::Sell { quantity }
        }
    }
}

fn hold(reason: HoldReason) -> Decision {
    Decision::Hold { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn run(
        outcome: Result<RawRecommendation, ProviderError>,
        price: f64,
        held: f64,
        cash: f64,
    ) -> Decision {
        let sizing = BuySizing::AllCash;
        decide(DecisionInput {
            outcome: &outcome,
            price,
            held,
            cash,
            sizing: &sizing,
        })
    }

    #[test]
    fn buy_sized_from_cash() {
        let d = run(Ok(RawRecommendation::action("BUY")), 50.0, 0.0, 1_000.0);
        assert_eq!(d, Decision::Buy { quantity: 20.0 });
    }

    #[test]
    fn buy_above_limit_holds() {
        let d = run(
            Ok(RawRecommendation::action("BUY").with_limit(45.0)),
            50.0,
            0.0,
            1_000.0,
        );
        assert!(matches!(
            d,
            Decision::Hold {
                reason: HoldReason::AboveBuyLimit { .. }
            }
        ));
    }

    #[test]
    fn buy_at_limit_executes() {
        let d = run(
            Ok(RawRecommendation::action("BUY").with_limit(50.0)),
            50.0,
            0.0,
            1_000.0,
        );
        assert_eq!(d, Decision::Buy { quantity: 20.0 });
    }

    #[test]
    fn buy_unaffordable_holds() {
        let d = run(Ok(RawRecommendation::action("BUY")), 50.0, 0.0, 10.0);
        assert_eq!(
            d,
            Decision::Hold {
                reason: HoldReason::Unaffordable
            }
        );
    }

    #[test]
    fn sell_without_hint_sells_everything() {
        let d = run(Ok(RawRecommendation::action("SELL")), 60.0, 10.0, 0.0);
        assert_eq!(d, Decision::Sell { quantity: 10.0 });
    }

    #[test]
    fn sell_hint_capped_at_held() {
        let d = run(
            Ok(RawRecommendation::action("SELL").with_quantity(25.0)),
            60.0,
            10.0,
            0.0,
        );
        assert_eq!(d, Decision::Sell { quantity: 10.0 });
        let d = run(
            Ok(RawRecommendation::action("SELL").with_quantity(4.0)),
            60.0,
            10.0,
            0.0,
        );
        assert_eq!(d, Decision::Sell { quantity: 4.0 });
    }

    #[test]
    fn fractional_hints_trade_whole_shares() {
        let d = run(
            Ok(RawRecommendation::action("SELL").with_quantity(2.5)),
            60.0,
            10.0,
            0.0,
        );
        assert_eq!(d, Decision::Sell { quantity: 2.0 });
        let d = run(
            Ok(RawRecommendation::action("BUY").with_quantity(2.5)),
            50.0,
            0.0,
            1_000.0,
        );
        assert_eq!(d, Decision::Buy { quantity: 2.0 });
    }

    #[test]
    fn sub_share_hint_is_not_reported_as_unaffordable() {
        for action in ["BUY", "SELL"] {
            let d = run(
                Ok(RawRecommendation::action(action).with_quantity(0.5)),
                50.0,
                10.0,
                1_000.0,
            );
            assert_eq!(
                d,
                Decision::Hold {
                    reason: HoldReason::FractionalHint { quantity: 0.5 }
                }
            );
        }
    }

    #[test]
    fn sell_with_nothing_held_holds() {
        let d = run(Ok(RawRecommendation::action("SELL")), 60.0, 0.0, 0.0);
        assert_eq!(
            d,
            Decision::Hold {
                reason: HoldReason::NothingToSell
            }
        );
    }

    #[test]
    fn sell_below_limit_holds() {
        let d = run(
            Ok(RawRecommendation::action("SELL").with_limit(65.0)),
            60.0,
            10.0,
            0.0,
        );
        assert!(matches!(
            d,
            Decision::Hold {
                reason: HoldReason::BelowSellLimit { .. }
            }
        ));
    }

    #[test]
    fn malformed_action_holds() {
        let d = run(Ok(RawRecommendation::action("MAYBE")), 60.0, 10.0, 1_000.0);
        match d {
            Decision::Hold {
                reason: HoldReason::Malformed(msg),
            } => assert!(msg.contains("MAYBE")),
            other => panic!("expected malformed hold, got {other:?}"),
        }
    }

    #[test]
    fn engine_error_holds() {
        let err = ProviderError::Unavailable {
            symbol: "SYM".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        };
        let d = run(Err(err), 60.0, 10.0, 1_000.0);
        assert!(matches!(
            d,
            Decision::Hold {
                reason: HoldReason::EngineError(_)
            }
        ));
    }

    #[test]
    fn degraded_reasons_flagged() {
        assert!(!HoldReason::Recommended.is_degraded());
        assert!(!HoldReason::NothingToSell.is_degraded());
        assert!(HoldReason::Malformed("x".into()).is_degraded());
        assert!(HoldReason::Rejected("x".into()).is_degraded());
    }
}
