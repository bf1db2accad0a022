// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an article came from. `live_monitor` marks articles stored by the live ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Newsapi,
    Gdelt,
    Rss,
    Manual,
    LiveMonitor,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceType::Newsapi => "newsapi",
            SourceType::Gdelt => "gdelt",
            SourceType::Rss => "rss",
            SourceType::Manual => "manual",
            SourceType::LiveMonitor => "live_monitor",
        };
        f.write_str(s)
    }
}

/// An article as delivered by a source adapter, before analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawArticle {
    pub headline: String,
    pub content: String,
    pub source: String,   // e.g., "Reuters", "bbc.co.uk"
    pub url: Option<String>,
    pub published_at: Option<String>, // RFC 3339 when the adapter could parse it
    pub source_type: SourceType,
}

/// What to fetch. Empty `keywords` means the adapter's default query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    pub keywords: Vec<String>,
    pub date_from: Option<String>, // YYYY-MM-DD
    pub date_to: Option<String>,
    pub max_articles: usize,
}

impl Default for FetchQuery {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            date_from: None,
            date_to: None,
            max_articles: crate::ingest::coordinator::DEFAULT_MAX_ARTICLES,
        }
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawArticle>>;
    fn name(&self) -> &'static str;
    fn source_type(&self) -> SourceType;
}
