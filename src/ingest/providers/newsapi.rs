// src/ingest/providers/newsapi.rs
//! NewsAPI `/v2/everything` adapter.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::normalize_text;
use crate::ingest::types::{FetchQuery, RawArticle, SourceAdapter, SourceType};

pub const ENDPOINT: &str = "https://newsapi.org/v2/everything";
const DEFAULT_QUERY: &str = "stock OR market OR economy OR earnings OR GDP";
const MAX_PAGE_SIZE: usize = 100;
const LOOKBACK_DAYS: i64 = 7;
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Response {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    #[serde(default)]
    source: Option<ArticleSource>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

pub struct NewsApiAdapter {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        api_key: Option<String>,
        client: reqwest::Client,
    },
}

impl NewsApiAdapter {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            mode: Mode::Http {
                api_key: api_key.filter(|k| !k.trim().is_empty()),
                client: reqwest::Client::new(),
            },
        }
    }

    /// Serve one in-memory `/everything` JSON body.
    pub fn from_fixture(json: &str) -> Self {
        Self {
            mode: Mode::Fixture(json.to_string()),
        }
    }

    /// Query parameters for one request, with the 7-day default window.
    pub fn query_params(query: &FetchQuery, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let q = if query.keywords.is_empty() {
            DEFAULT_QUERY.to_string()
        } else {
            query.keywords.join(" OR ")
        };
        let from = query
            .date_from
            .clone()
            .unwrap_or_else(|| (now - ChronoDuration::days(LOOKBACK_DAYS)).format("%Y-%m-%d").to_string());
        let to = query
            .date_to
            .clone()
            .unwrap_or_else(|| now.format("%Y-%m-%d").to_string());
        vec![
            ("q", q),
            ("from", from),
            ("to", to),
            ("language", "en".to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", query.max_articles.clamp(1, MAX_PAGE_SIZE).to_string()),
        ]
    }

    fn parse(body: &str, max: usize) -> Result<Vec<RawArticle>> {
        let resp: Response = serde_json::from_str(body).context("parsing newsapi json")?;
        if resp.status != "ok" {
            bail!(
                "newsapi status {}: {}",
                resp.status,
                resp.message.unwrap_or_default()
            );
        }
        Ok(resp
            .articles
            .into_iter()
            .take(max)
            .filter_map(format_article)
            .collect())
    }
}

fn format_article(a: Article) -> Option<RawArticle> {
    let content = a.content.unwrap_or_default();
    if content.trim().is_empty() || content.trim() == "[Removed]" {
        return None;
    }
    let description = a.description.unwrap_or_default();
    Some(RawArticle {
        headline: normalize_text(a.title.as_deref().unwrap_or_default()),
        content: normalize_text(&format!("{description} {content}")),
        source: a
            .source
            .and_then(|s| s.name)
            .unwrap_or_else(|| "Unknown".to_string()),
        url: a.url.filter(|u| !u.trim().is_empty()),
        published_at: a.published_at.as_deref().and_then(|p| {
            DateTime::parse_from_rfc3339(p)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        }),
        source_type: SourceType::Newsapi,
    })
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawArticle>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse(s, query.max_articles),

            Mode::Http { api_key, client } => {
                let key = api_key
                    .as_deref()
                    .ok_or_else(|| anyhow!("NewsAPI key is not configured"))?;
                let mut params = Self::query_params(query, Utc::now());
                params.push(("apiKey", key.to_string()));
                let body = client
                    .get(ENDPOINT)
                    .query(&params)
                    .timeout(TIMEOUT)
                    .send()
                    .await
                    .context("newsapi get()")?
                    .error_for_status()
                    .context("newsapi status")?
                    .text()
                    .await
                    .context("newsapi .text()")?;
                Self::parse(&body, query.max_articles)
            }
        }
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Newsapi
    }
}
