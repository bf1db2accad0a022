// src/live/mod.rs
//! Live monitor: a recurring bounded ingestion pass whose results are pushed to subscribers.
//!
//! `stopped → running` on [`LiveMonitor::start`] (one immediate tick, then one per interval);
//! `running → stopped` on [`LiveMonitor::stop`] (future ticks cancelled, an in-flight tick
//! completes). Scheduled ticks and manual triggers share one async guard, so passes never
//! overlap.

pub mod subscribers;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::analyze::types::{Impact, NewsType, Scope};
use crate::ingest::coordinator::Ingestor;
use crate::ingest::types::{FetchQuery, SourceAdapter, SourceType};
use crate::store::StoredArticle;

pub use subscribers::{ChannelSink, LiveSink, SubscriberRegistry};

pub const LIVE_KEYWORDS: [&str; 7] = [
    "stock market",
    "breaking news",
    "earnings",
    "market",
    "stocks",
    "economy",
    "Federal Reserve",
];
pub const LIVE_LOOKBACK_HOURS: i64 = 2;
pub const LIVE_MAX_PER_SOURCE: usize = 20;
/// One day.
pub const MAX_INTERVAL_MINUTES: u64 = 24 * 60;

/// Stored article as announced to live subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleBrief {
    pub id: u64,
    pub headline: String,
    pub source: String,
    pub scope: Scope,
    pub news_type: NewsType,
    pub impact: Impact,
    pub published_at: Option<String>,
}

impl From<&StoredArticle> for ArticleBrief {
    fn from(a: &StoredArticle) -> Self {
        let r = &a.intelligence;
        Self {
            id: a.id,
            headline: r.headline.clone(),
            source: r.source.clone(),
            scope: r.scope,
            news_type: r.news_type,
            impact: r.impact,
            published_at: r.published_at.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    pub last_fetch: Option<String>,
    pub new_articles: usize,
    pub total_processed: u64,
}

/// Messages pushed to live subscribers (JSON, tagged by `type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    Connected {
        message: String,
        interval_minutes: u64,
        total_processed: u64,
    },
    NewArticle {
        article: ArticleBrief,
    },
    StatsUpdate {
        stats: TickStats,
    },
    /// Reply to a client's `stats` request.
    Stats {
        total_processed: u64,
        last_fetch: Option<String>,
        subscribers: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub status: String,
    pub interval_minutes: u64,
    pub total_processed: u64,
    pub last_fetch: Option<String>,
    pub active_subscribers: usize,
}

#[derive(Default)]
struct State {
    cancel: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
    last_fetch: Option<DateTime<Utc>>,
    total_processed: u64,
}

pub struct LiveMonitor {
    ingestor: Ingestor,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    registry: Arc<SubscriberRegistry>,
    interval: Duration,
    state: Mutex<State>,
    tick_guard: tokio::sync::Mutex<()>,
}

impl LiveMonitor {
    pub fn new(
        ingestor: Ingestor,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        registry: Arc<SubscriberRegistry>,
        interval_minutes: u64,
    ) -> Self {
        Self::with_interval(
            ingestor,
            adapters,
            registry,
            Duration::from_secs(interval_minutes.clamp(1, MAX_INTERVAL_MINUTES) * 60),
        )
    }

    /// Any interval; sub-minute values are for tests.
    pub fn with_interval(
        ingestor: Ingestor,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        registry: Arc<SubscriberRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            ingestor,
            adapters,
            registry,
            interval: interval.max(Duration::from_millis(1)),
            state: Mutex::new(State::default()),
            tick_guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    pub fn interval_minutes(&self) -> u64 {
        (self.interval.as_secs() / 60).max(1)
    }

    pub fn is_running(&self) -> bool {
        self.state
            .lock()
            .expect("live state mutex poisoned")
            .cancel
            .is_some()
    }

    pub fn total_processed(&self) -> u64 {
        self.state
            .lock()
            .expect("live state mutex poisoned")
            .total_processed
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.state.lock().expect("live state mutex poisoned").last_fetch
    }

    /// Start the ticker. No-op (returns false) when already running.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut st = self.state.lock().expect("live state mutex poisoned");
        if st.cancel.is_some() {
            return false;
        }
        let (tx, mut rx) = watch::channel(false);
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let _guard = this.tick_guard.lock().await;
                        // stop() may have landed while a manual pass held the guard
                        if *rx.borrow() {
                            break;
                        }
                        this.tick_locked().await;
                    }
                }
            }
            tracing::info!(target: "live", "live monitor loop exited");
        });
        st.cancel = Some(tx);
        st.task = Some(handle);
        tracing::info!(target: "live", interval_secs = self.interval.as_secs(), "live monitor started");
        true
    }

    /// Cancel future ticks. An in-flight tick runs to completion. No-op when stopped.
    pub fn stop(&self) -> bool {
        let mut st = self.state.lock().expect("live state mutex poisoned");
        let Some(cancel) = st.cancel.take() else {
            return false;
        };
        let _ = cancel.send(true);
        st.task = None;
        tracing::info!(target: "live", "live monitor stopped");
        true
    }

    /// Run one pass now unless one is already running. `None` means busy.
    pub async fn trigger(&self) -> Option<TickStats> {
        let _guard = self.tick_guard.try_lock().ok()?;
        Some(self.tick_locked().await)
    }

    /// Run one pass, waiting for any in-flight pass first.
    pub async fn tick(&self) -> TickStats {
        let _guard = self.tick_guard.lock().await;
        self.tick_locked().await
    }

    pub fn status(&self) -> LiveStatus {
        let st = self.state.lock().expect("live state mutex poisoned");
        LiveStatus {
            status: if st.cancel.is_some() { "running" } else { "stopped" }.to_string(),
            interval_minutes: self.interval_minutes(),
            total_processed: st.total_processed,
            last_fetch: st.last_fetch.map(|t| t.to_rfc3339()),
            active_subscribers: self.registry.len(),
        }
    }

    pub fn connected_event(&self) -> LiveEvent {
        LiveEvent::Connected {
            message: "Connected to live news feed".to_string(),
            interval_minutes: self.interval_minutes(),
            total_processed: self.total_processed(),
        }
    }

    pub fn stats_event(&self) -> LiveEvent {
        let st = self.state.lock().expect("live state mutex poisoned");
        LiveEvent::Stats {
            total_processed: st.total_processed,
            last_fetch: st.last_fetch.map(|t| t.to_rfc3339()),
            subscribers: self.registry.len(),
        }
    }

    fn live_query(now: DateTime<Utc>) -> FetchQuery {
        FetchQuery {
            keywords: LIVE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            date_from: Some(
                (now - ChronoDuration::hours(LIVE_LOOKBACK_HOURS))
                    .format("%Y-%m-%d")
                    .to_string(),
            ),
            date_to: None,
            max_articles: LIVE_MAX_PER_SOURCE,
        }
    }

    /// Caller holds `tick_guard`.
    async fn tick_locked(&self) -> TickStats {
        let query = Self::live_query(Utc::now());
        let report = self
            .ingestor
            .pass(&self.adapters, &query, Some(SourceType::LiveMonitor), |_| {})
            .await;

        let now = Utc::now();
        let new_articles = report.stored.len();
        let total_processed = {
            let mut st = self.state.lock().expect("live state mutex poisoned");
            st.last_fetch = Some(now);
            st.total_processed += new_articles as u64;
            st.total_processed
        };
        counter!("live_ticks_total").increment(1);
        gauge!("live_last_tick_ts").set(now.timestamp() as f64);

        for row in &report.stored {
            self.registry.broadcast(&LiveEvent::NewArticle {
                article: ArticleBrief::from(row),
            });
        }
        let stats = TickStats {
            last_fetch: Some(now.to_rfc3339()),
            new_articles,
            total_processed,
        };
        self.registry.broadcast(&LiveEvent::StatsUpdate {
            stats: stats.clone(),
        });

        tracing::info!(
            target: "live",
            new_articles,
            total_processed,
            skipped = report.progress.skipped,
            failed = report.progress.failed,
            "live tick finished"
        );
        stats
    }
}
