use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One product idea suggested by the research prompt.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Recommendation {
    pub product_name: String,
    /// Free-form range in yen, e.g. `2000-3000`.
    #[serde(default)]
    pub price_range: String,
    /// Why the product should sell, usually tied to a social media trend.
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub search_keywords: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub category: String,
}

/// A stored batch of recommendations.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchLog {
    pub id: i32,
    /// Day the research was run.
    pub research_date: NaiveDate,
    pub recommendations: Vec<Recommendation>,
    pub created_at: NaiveDateTime,
}

/// Payload required to store a research batch.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResearchLog {
    pub research_date: NaiveDate,
    pub recommendations: Vec<Recommendation>,
    pub created_at: NaiveDateTime,
}

impl NewResearchLog {
    /// Stamp `recommendations` with the time the research finished.
    pub fn new(recommendations: Vec<Recommendation>, created_at: NaiveDateTime) -> Self {
        Self {
            research_date: created_at.date(),
            recommendations,
            created_at,
        }
    }
}
