// src/ingest/providers/rss.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    OffsetDateTime, UtcOffset,
};

use crate::ingest::types::{FetchQuery, RawArticle, SourceAdapter, SourceType};
use crate::ingest::{matches_keywords, normalize_text};

/// At most this many configured feeds are read per fetch.
pub const MAX_FEEDS: usize = 5;
const FEED_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn rfc2822_to_rfc3339(ts: &str) -> Option<String> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

pub struct RssAdapter {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        feeds: Vec<String>,
        client: reqwest::Client,
    },
}

impl RssAdapter {
    pub fn new(feeds: Vec<String>) -> Self {
        Self {
            mode: Mode::Http {
                feeds,
                client: reqwest::Client::new(),
            },
        }
    }

    /// Serve one in-memory RSS document instead of fetching feeds.
    pub fn from_fixture(xml: &str) -> Self {
        Self {
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    fn parse_feed(xml: &str, keywords: &[String], max: usize) -> Result<Vec<RawArticle>> {
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
        let source = rss
            .channel
            .title
            .as_deref()
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "RSS".to_string());

        let mut out = Vec::new();
        for it in rss.channel.item.into_iter().take(max) {
            let headline = normalize_text(it.title.as_deref().unwrap_or_default());
            if headline.is_empty() {
                continue;
            }
            let content = normalize_text(it.description.as_deref().unwrap_or_default());
            if !matches_keywords(&format!("{headline} {content}"), keywords) {
                continue;
            }
            out.push(RawArticle {
                headline,
                content,
                source: source.clone(),
                url: it.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
                published_at: it.pub_date.as_deref().and_then(rfc2822_to_rfc3339),
                source_type: SourceType::Rss,
            });
        }
        Ok(out)
    }

    async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<String> {
        let resp = client
            .get(url)
            .timeout(FEED_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("rss get {url}"))?
            .error_for_status()
            .with_context(|| format!("rss status {url}"))?;
        resp.text().await.context("rss .text()")
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<RawArticle>> {
        let max = query.max_articles;
        match &self.mode {
            Mode::Fixture(s) => Self::parse_feed(s, &query.keywords, max),

            Mode::Http { feeds, client } => {
                if feeds.is_empty() {
                    return Err(anyhow!("no rss feeds configured"));
                }
                let mut out = Vec::new();
                let mut last_err = None;
                let mut any_ok = false;
                for url in feeds.iter().take(MAX_FEEDS) {
                    let parsed = match Self::fetch_feed(client, url).await {
                        Ok(body) => Self::parse_feed(&body, &query.keywords, max),
                        Err(e) => Err(e),
                    };
                    match parsed {
                        Ok(mut v) => {
                            any_ok = true;
                            out.append(&mut v);
                            if out.len() >= max {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(target: "ingest", error = ?e, feed = %url, "rss feed error");
                            counter!("ingest_source_errors_total", "source" => "rss").increment(1);
                            last_err = Some(e);
                        }
                    }
                }
                match (any_ok, last_err) {
                    (false, Some(e)) => Err(e.context("every rss feed failed")),
                    _ => {
                        out.truncate(max);
                        Ok(out)
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "rss"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Rss
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
