// src/ingest/providers/gdelt.rs
//! GDELT DOC 2.0 article-list adapter. GDELT returns titles only, so the title doubles as
//! content.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::normalize_text;
use crate::ingest::types::{FetchQuery, RawArticle, SourceAdapter, SourceType};

pub const ENDPOINT: &str = "https://api.gdeltproject.org/api/v2/doc/doc";
const DEFAULT_QUERY: &str = "financial markets economy";
const MAX_RECORDS: usize = 250;
const TIMESPAN: &str = "24h";
const SEENDATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    url: Option<String>,
    title: Option<String>,
    seendate: Option<String>,
    domain: Option<String>,
}

pub struct GdeltAdapter {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http(reqwest::Client),
}

impl Default for GdeltAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl GdeltAdapter {
    pub fn new() -> Self {
        Self {
            mode: Mode::Http(reqwest::Client::new()),
        }
    }

    pub fn from_fixture(json: &str) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
        }
    }

    pub fn query_params(query: &FetchQuery) -> Vec<(&'static str, String)> {
        let q = if query.keywords.is_empty() {
            DEFAULT_QUERY.to_string()
        } else {
            query.keywords.join(" ")
        };
        vec![
            ("query", q),
            ("mode", "artlist".to_string()),
            ("maxrecords", query.max_articles.clamp(1, MAX_RECORDS).to_string()),
            ("timespan", TIMESPAN.to_string()),
            ("format", "json".to_string()),
        ]
    }

    fn parse(body: &str, max: usize) -> Result<Vec<RawArticle>> {
        let resp: Response = serde_json::from_str(body).context("parsing gdelt json")?;
        Ok(resp
            .articles
            .into_iter()
            .take(max)
            .filter_map(|a| {
                let title = normalize_text(a.title.as_deref().unwrap_or_default());
                if title.is_empty() {
                    return None;
                }
                Some(RawArticle {
                    headline: title.clone(),
                    content: title,
                    source: a
                        .domain
                        .filter(|d| !d.trim().is_empty())
                        .unwrap_or_else(|| "GDELT".to_string()),
                    url: a.url.filter(|u| !u.trim().is_empty()),
                    published_at: a.seendate.as_deref().and_then(seendate_to_rfc3339),
                    source_type: SourceType::Gdelt,
                })
            })
            .collect())
    }
}

fn seendate_to_rfc3339(s: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(s.trim(), SEENDATE_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().to_rfc3339())
}

#[async_trait]
impl SourceAdapter for GdeltAdapter {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawArticle>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse(s, query.max_articles),
            Mode::Http(client) => {
                let body = client
                    .get(ENDPOINT)
                    .query(&Self::query_params(query))
                    .timeout(TIMEOUT)
                    .send()
                    .await
                    .context("gdelt get()")?
                    .error_for_status()
                    .context("gdelt status")?
                    .text()
                    .await
                    .context("gdelt .text()")?;
                Self::parse(&body, query.max_articles)
            }
        }
    }

    fn name(&self) -> &'static str {
        "gdelt"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Gdelt
    }
}
