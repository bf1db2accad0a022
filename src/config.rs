// src/config.rs
//! Application configuration: TOML file first, environment overrides on top.
//!
//! File lookup: `$NEWS_CONFIG_PATH` → `config/news.toml` → built-in defaults.
//! Env overrides: `NEWSAPI_KEY`, `RSS_FEEDS` (comma-separated), `LIVE_INTERVAL_MINUTES`,
//! `MAX_ARTICLES_PER_BATCH`, `JOB_RETENTION`, `STORE_SNAPSHOT_PATH`, `LEXICON_DIR`,
//! `BIND_ADDR`, `LIVE_MONITOR` (`0`/`false` disables).

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::ingest::config::parse_feed_csv;

pub const ENV_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/news.toml";

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_interval() -> u64 {
    5
}
fn default_max_articles() -> usize {
    100
}
fn default_retention() -> usize {
    crate::ingest::jobs::DEFAULT_RETENTION
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Never logged.
    #[serde(skip_serializing)]
    pub newsapi_key: Option<String>,
    pub rss_feeds: Vec<String>,
    #[serde(default = "default_true")]
    pub live_monitor: bool,
    #[serde(default = "default_interval")]
    pub live_interval_minutes: u64,
    #[serde(default = "default_max_articles")]
    pub max_articles_per_batch: usize,
    #[serde(default = "default_retention")]
    pub job_retention: usize,
    pub store_snapshot_path: Option<PathBuf>,
    pub lexicon_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            newsapi_key: None,
            rss_feeds: Vec::new(),
            live_monitor: true,
            live_interval_minutes: default_interval(),
            max_articles_per_batch: default_max_articles(),
            job_retention: default_retention(),
            store_snapshot_path: None,
            lexicon_dir: None,
        }
    }
}

impl AppConfig {
    /// File (if any) + env overrides + sanitation.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) if !p.trim().is_empty() => {
                let pb = PathBuf::from(p.trim());
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Self::load_from_file(&pb)?
            }
            _ => {
                let p = Path::new(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(p)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env(|k| env::var(k).ok())?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    /// Apply overrides from `get` (env in production, a map in tests).
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("NEWSAPI_KEY") {
            self.newsapi_key = Some(v);
        }
        if let Some(v) = get("RSS_FEEDS") {
            self.rss_feeds = parse_feed_csv(&v);
        }
        if let Some(v) = get("LIVE_INTERVAL_MINUTES") {
            self.live_interval_minutes = v
                .parse()
                .with_context(|| format!("LIVE_INTERVAL_MINUTES={v:?}"))?;
        }
        if let Some(v) = get("MAX_ARTICLES_PER_BATCH") {
            self.max_articles_per_batch = v
                .parse()
                .with_context(|| format!("MAX_ARTICLES_PER_BATCH={v:?}"))?;
        }
        if let Some(v) = get("JOB_RETENTION") {
            self.job_retention = v.parse().with_context(|| format!("JOB_RETENTION={v:?}"))?;
        }
        if let Some(v) = get("STORE_SNAPSHOT_PATH") {
            self.store_snapshot_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(crate::lexicon::ENV_LEXICON_DIR) {
            self.lexicon_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = get("LIVE_MONITOR") {
            self.live_monitor = !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off");
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        self.live_interval_minutes = self
            .live_interval_minutes
            .clamp(1, crate::live::MAX_INTERVAL_MINUTES);
        self.max_articles_per_batch = self
            .max_articles_per_batch
            .clamp(1, crate::ingest::coordinator::MAX_ARTICLES_LIMIT);
        self.job_retention = self.job_retention.max(1);
        self.newsapi_key = self.newsapi_key.take().filter(|k| !k.trim().is_empty());
    }
}
