// src/ingest/config.rs
//! RSS feed list: locating the list file, reading it, and cleaning the URLs.
//!
//! A list is either a TOML table `feeds = [...]` or JSON (a bare array or `{"feeds": [...]}`).
//! Entries are trimmed, must be `http`/`https` URLs, and keep their first-seen order.
use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_FEEDS_PATH: &str = "RSS_FEEDS_PATH";

/// Checked in order when `RSS_FEEDS_PATH` is unset.
const SEARCH_PATHS: [&str; 2] = ["config/rss_feeds.toml", "config/rss_feeds.json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct FeedTable {
    feeds: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonFeeds {
    List(Vec<String>),
    Table(FeedTable),
}

/// Ordered, de-duplicated feed URLs.
#[derive(Debug, Default)]
struct FeedList(Vec<String>);

impl FeedList {
    fn push(&mut self, raw: &str) {
        let url = raw.trim();
        if url.is_empty() || self.0.iter().any(|u| u == url) {
            return;
        }
        match Url::parse(url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => self.0.push(url.to_string()),
            _ => tracing::warn!(target: "ingest", entry = url, "skipping feed entry that is not an http(s) URL"),
        }
    }

    fn collect<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut list = Self::default();
        for r in raw {
            list.push(r);
        }
        list.0
    }
}

/// Comma-separated list (the `RSS_FEEDS` env form).
pub fn parse_feed_csv(s: &str) -> Vec<String> {
    FeedList::collect(s.split(','))
}

fn decode(body: &str, format: Option<Format>) -> Result<Vec<String>> {
    let raw = match format {
        Some(Format::Toml) => toml::from_str::<FeedTable>(body)?.feeds,
        Some(Format::Json) => match serde_json::from_str::<JsonFeeds>(body)? {
            JsonFeeds::List(v) | JsonFeeds::Table(FeedTable { feeds: v }) => v,
        },
        None => return decode(body, Some(Format::Json)).or_else(|_| decode(body, Some(Format::Toml))),
    };
    Ok(FeedList::collect(raw.iter().map(String::as_str)))
}

/// Read one feed list file; the format follows the extension, unknown extensions try both.
pub fn load_feeds_from(path: &Path) -> Result<Vec<String>> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    decode(&body, Format::of(path)).with_context(|| format!("parsing feed list {}", path.display()))
}

/// `$RSS_FEEDS_PATH` (which must exist), else the first existing search path.
fn locate() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_FEEDS_PATH) {
        let path = PathBuf::from(p);
        return if path.exists() {
            Ok(Some(path))
        } else {
            Err(anyhow!("{ENV_FEEDS_PATH} points to non-existent path {}", path.display()))
        };
    }
    Ok(SEARCH_PATHS.iter().map(PathBuf::from).find(|p| p.exists()))
}

/// Feed list from the located file, or empty when there is none.
pub fn load_feeds_default() -> Result<Vec<String>> {
    match locate()? {
        Some(path) => {
            let feeds = load_feeds_from(&path)?;
            tracing::info!(target: "ingest", feeds = feeds.len(), path = %path.display(), "feed list loaded");
            Ok(feeds)
        }
        None => Ok(Vec::new()),
    }
}
