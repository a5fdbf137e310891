//! Trading recommendations: the untrusted wire shape and its validated form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

impl FromStr for Action {
    type Err = RecommendationError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "HOLD" => Ok(Action::Hold),
            _ => Err(RecommendationError::UnknownAction(s.to_string())),
        }
    }
}

/// Why a raw recommendation failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendationError {
    #[error("unknown action '{0}' (expected BUY, SELL or HOLD)")]
    UnknownAction(String),

    #[error("invalid limit price {0}: must be finite and > 0")]
    InvalidLimitPrice(f64),

    #[error("invalid quantity {0}: must be finite and > 0")]
    InvalidQuantity(f64),

    #[error("invalid confidence {0}: must be within [0, 1]")]
    InvalidConfidence(f64),
}

/// Recommendation as produced by a collaborator, before any checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecommendation {
    pub action: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub limit_price: Option<f64>,
    #[serde(default, alias = "quantity_hint")]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub rationale: String,
}

impl RawRecommendation {
    /// Bare action with no limit, quantity or confidence.
    pub fn action(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            confidence: None,
            limit_price: None,
            quantity: None,
            rationale: String::new(),
        }
    }

    pub fn with_limit(mut self, limit_price: f64) -> Self {
        self.limit_price = Some(limit_price);
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Check every field and produce a [`Recommendation`].
    pub fn validate(&self) -> Result<Recommendation, RecommendationError> {
        let action: Action = self.action.parse()?;

        if let Some(limit) = self.limit_price {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(RecommendationError::InvalidLimitPrice(limit));
            }
        }
        if let Some(qty) = self.quantity {
            if !(qty.is_finite() && qty > 0.0) {
                return Err(RecommendationError::InvalidQuantity(qty));
            }
        }
        if let Some(conf) = self.confidence {
            if !(0.0..=1.0).contains(&conf) {
                return Err(RecommendationError::InvalidConfidence(conf));
            }
        }

        Ok(Recommendation {
            action,
            confidence: self.confidence,
            limit_price: self.limit_price,
            quantity: self.quantity,
            rationale: self.rationale.clone(),
        })
    }
}

/// Validated recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    pub confidence: Option<f64>,
    /// Upper bound on the buy price, lower bound on the sell price.
    pub limit_price: Option<f64>,
    pub quantity: Option<f64>,
    pub rationale: String,
}
