// src/analyze/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic / organizational breadth of an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Global,
    Country,
    Sector,
    Company,
}

/// Topical bucket. Declaration order is the tie-break order of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsType {
    Macro,
    Earnings,
    Policy,
    Geopolitical,
    Corporate,
    Sentiment,
}

impl NewsType {
    pub const ORDER: [NewsType; 6] = [
        NewsType::Macro,
        NewsType::Earnings,
        NewsType::Policy,
        NewsType::Geopolitical,
        NewsType::Corporate,
        NewsType::Sentiment,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Positive,
    Negative,
    Neutral,
    Unclear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeHorizon {
    Short,
    Medium,
    Long,
}

macro_rules! label_display {
    ($($t:ty),*) => {$(
        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    )*};
}
label_display!(Scope, NewsType, Direction, TimeHorizon);

impl std::str::FromStr for Scope {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(Scope::Global),
            "country" => Ok(Scope::Country),
            "sector" => Ok(Scope::Sector),
            "company" => Ok(Scope::Company),
            other => Err(format!("unknown scope {other:?}")),
        }
    }
}

impl std::str::FromStr for NewsType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NewsType::ORDER
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown news type {s:?}"))
    }
}

/// Entity lists; each is unique and holds at most [`Entities::CAP`] items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    pub countries: Vec<String>,
    pub sectors: Vec<String>,
    pub companies: Vec<String>,
    pub indices: Vec<String>,
}

impl Entities {
    pub const CAP: usize = 5;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub direction: Direction,
    /// In [0, 1], rounded to two decimals.
    pub confidence: f64,
    pub time_horizon: TimeHorizon,
}

/// Structured output of the analysis pipeline. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceRecord {
    pub headline: String,
    pub source: String,
    /// As supplied by the source; not parsed or validated.
    pub published_at: Option<String>,
    pub scope: Scope,
    pub news_type: NewsType,
    pub entities: Entities,
    pub impact: Impact,
    pub facts: Vec<String>,
    pub summary: String,
}
