use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// News article summary handed to the recommendation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub published_date: Option<NaiveDate>,
}

impl Article {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            published_date: None,
        }
    }

    /// One-line `title - summary` form used when building prompts.
    pub fn headline(&self) -> String {
        if self.summary.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.summary)
        }
    }
}
