// src/lib.rs
// Public library surface for integration tests and the binary.

pub mod analyze;
pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod lexicon;
pub mod live;
pub mod metrics;
pub mod store;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

pub use crate::analyze::NewsAnalyzer;
pub use crate::api::{router, AppState};
pub use crate::error::PipelineError;

use crate::config::AppConfig;
use crate::ingest::coordinator::{BatchCoordinator, Ingestor};
use crate::ingest::jobs::JobRegistry;
use crate::ingest::providers::{GdeltAdapter, NewsApiAdapter, RssAdapter};
use crate::ingest::types::SourceAdapter;
use crate::lexicon::Lexicon;
use crate::live::{LiveMonitor, SubscriberRegistry};
use crate::store::{ArticleStore, MemoryArticleStore};

/// Wire analyzer, store, adapters, jobs and the live monitor from `cfg`. Does not start the
/// monitor.
pub fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let lexicon = match &cfg.lexicon_dir {
        Some(dir) => Lexicon::from_dir(dir)
            .with_context(|| format!("loading lexicon from {}", dir.display()))?,
        None => Lexicon::global().clone(),
    };
    let analyzer = Arc::new(NewsAnalyzer::new(Arc::new(lexicon)));

    let store: Arc<dyn ArticleStore> = match &cfg.store_snapshot_path {
        Some(p) => Arc::new(MemoryArticleStore::with_snapshot(p)?),
        None => Arc::new(MemoryArticleStore::new()),
    };

    let mut feeds = cfg.rss_feeds.clone();
    if feeds.is_empty() {
        feeds = crate::ingest::config::load_feeds_default()?;
    }
    info!(
        target: "startup",
        feeds = feeds.len(),
        newsapi = cfg.newsapi_key.is_some(),
        "source adapters configured"
    );

    let newsapi: Arc<dyn SourceAdapter> = Arc::new(NewsApiAdapter::new(cfg.newsapi_key.clone()));
    let gdelt: Arc<dyn SourceAdapter> = Arc::new(GdeltAdapter::new());
    let rss: Arc<dyn SourceAdapter> = Arc::new(RssAdapter::new(feeds));

    let ingestor = Ingestor::new(Arc::clone(&analyzer), Arc::clone(&store));
    let jobs = Arc::new(JobRegistry::with_retention(cfg.job_retention));
    let coordinator = Arc::new(
        BatchCoordinator::new(
            ingestor.clone(),
            vec![Arc::clone(&newsapi), Arc::clone(&gdelt), rss],
            jobs,
        )
        .with_max_articles(cfg.max_articles_per_batch),
    );

    // the live pass polls the two near-real-time sources
    let monitor = Arc::new(LiveMonitor::new(
        ingestor,
        vec![newsapi, gdelt],
        Arc::new(SubscriberRegistry::new()),
        cfg.live_interval_minutes,
    ));

    Ok(AppState {
        analyzer,
        store,
        coordinator,
        monitor,
    })
}
