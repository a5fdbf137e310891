use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Portfolio value at the close of one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    pub total_value: f64,
}
