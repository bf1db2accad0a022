// tests/live_monitor.rs
//
// Live monitor lifecycle, tick serialization and subscriber fanout.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use news_intel::ingest::coordinator::Ingestor;
use news_intel::ingest::types::{FetchQuery, RawArticle, SourceAdapter, SourceType};
use news_intel::live::{ChannelSink, LiveEvent, LiveMonitor, LiveSink, SubscriberRegistry, LIVE_MAX_PER_SOURCE};
use news_intel::store::{ArticleStore, MemoryArticleStore};
use news_intel::NewsAnalyzer;

fn article(url: &str) -> RawArticle {
    RawArticle {
        headline: "Stocks rally as earnings beat estimates".into(),
        content: "The S&P 500 rose 1.2% on Thursday after several companies reported quarterly profit above expectations."
            .into(),
        source: "Wire".into(),
        url: Some(url.into()),
        published_at: None,
        source_type: SourceType::Newsapi,
    }
}

struct FixedAdapter(Vec<RawArticle>);

#[async_trait]
impl SourceAdapter for FixedAdapter {
    async fn fetch(&self, query: &FetchQuery) -> anyhow::Result<Vec<RawArticle>> {
        assert_eq!(query.max_articles, LIVE_MAX_PER_SOURCE);
        assert!(query.date_from.is_some());
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "newsapi"
    }
    fn source_type(&self) -> SourceType {
        SourceType::Newsapi
    }
}

/// Blocks inside `fetch` until released.
struct GateAdapter {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl SourceAdapter for GateAdapter {
    async fn fetch(&self, _query: &FetchQuery) -> anyhow::Result<Vec<RawArticle>> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(Vec::new())
    }
    fn name(&self) -> &'static str {
        "gdelt"
    }
    fn source_type(&self) -> SourceType {
        SourceType::Gdelt
    }
}

/// Counts fetches; the first one blocks until released.
struct HoldFirstAdapter {
    calls: AtomicUsize,
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl SourceAdapter for HoldFirstAdapter {
    async fn fetch(&self, _query: &FetchQuery) -> anyhow::Result<Vec<RawArticle>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.notify_one();
            self.release.notified().await;
        }
        Ok(Vec::new())
    }
    fn name(&self) -> &'static str {
        "newsapi"
    }
    fn source_type(&self) -> SourceType {
        SourceType::Newsapi
    }
}

struct BrokenSink;

impl LiveSink for BrokenSink {
    fn deliver(&self, _event: &LiveEvent) -> anyhow::Result<()> {
        anyhow::bail!("socket closed")
    }
}

fn monitor(adapters: Vec<Arc<dyn SourceAdapter>>, interval: Duration) -> Arc<LiveMonitor> {
    let store: Arc<dyn ArticleStore> = Arc::new(MemoryArticleStore::new());
    let ingestor = Ingestor::new(Arc::new(NewsAnalyzer::default()), store);
    Arc::new(LiveMonitor::with_interval(
        ingestor,
        adapters,
        Arc::new(SubscriberRegistry::new()),
        interval,
    ))
}

fn fixed(urls: &[&str]) -> Arc<dyn SourceAdapter> {
    Arc::new(FixedAdapter(urls.iter().map(|u| article(u)).collect()))
}

#[tokio::test]
async fn repeated_ticks_do_not_recount_stored_urls() {
    let m = monitor(vec![fixed(&["https://live.test/1", "https://live.test/2"])], Duration::from_secs(3600));

    let first = m.tick().await;
    assert_eq!(first.new_articles, 2);
    assert_eq!(first.total_processed, 2);
    assert!(first.last_fetch.is_some());

    let second = m.tick().await;
    assert_eq!(second.new_articles, 0);
    assert_eq!(second.total_processed, 2);
    assert_eq!(m.total_processed(), 2);
}

#[tokio::test]
async fn tick_broadcasts_articles_then_stats() {
    let m = monitor(vec![fixed(&["https://live.test/a"])], Duration::from_secs(3600));
    let (sink, mut rx) = ChannelSink::pair(16);
    m.registry().register(Box::new(sink));

    m.tick().await;

    match rx.recv().await {
        Some(LiveEvent::NewArticle { article }) => {
            assert_eq!(article.id, 1);
            assert_eq!(article.source, "Wire");
        }
        other => panic!("expected new_article, got {other:?}"),
    }
    match rx.recv().await {
        Some(LiveEvent::StatsUpdate { stats }) => {
            assert_eq!(stats.new_articles, 1);
            assert_eq!(stats.total_processed, 1);
        }
        other => panic!("expected stats_update, got {other:?}"),
    }
}

#[tokio::test]
async fn broken_subscriber_is_pruned_and_others_still_receive() {
    let m = monitor(vec![fixed(&["https://live.test/p"])], Duration::from_secs(3600));
    let (sink, mut rx) = ChannelSink::pair(16);
    m.registry().register(Box::new(BrokenSink));
    m.registry().register(Box::new(sink));
    assert_eq!(m.registry().len(), 2);

    let stats = m.tick().await;
    assert_eq!(stats.new_articles, 1);
    assert_eq!(m.registry().len(), 1);
    assert!(matches!(rx.recv().await, Some(LiveEvent::NewArticle { .. })));
    assert_eq!(m.status().active_subscribers, 1);
}

#[tokio::test]
async fn trigger_reports_busy_while_a_pass_runs() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let gate: Arc<dyn SourceAdapter> = Arc::new(GateAdapter {
        started: started.clone(),
        release: release.clone(),
    });
    let m = monitor(vec![gate], Duration::from_secs(3600));

    let running = {
        let m = m.clone();
        tokio::spawn(async move { m.trigger().await })
    };
    started.notified().await;

    assert!(m.trigger().await.is_none(), "second pass must not overlap");

    release.notify_one();
    let first = running.await.expect("trigger task");
    assert_eq!(first.map(|s| s.new_articles), Some(0));
}

#[tokio::test]
async fn start_runs_an_immediate_pass_and_stop_is_idempotent() {
    let m = monitor(vec![fixed(&["https://live.test/s"])], Duration::from_secs(3600));
    assert_eq!(m.status().status, "stopped");

    assert!(m.start());
    assert!(!m.start(), "already running");
    assert!(m.is_running());
    assert_eq!(m.status().status, "running");

    for _ in 0..100 {
        if m.total_processed() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(m.total_processed(), 1);
    assert!(m.last_fetch().is_some());

    assert!(m.stop());
    assert!(!m.stop());
    assert!(!m.is_running());
    assert_eq!(m.status().status, "stopped");

    // restart after stop
    assert!(m.start());
    assert!(m.stop());
}

#[tokio::test]
async fn stop_cancels_a_scheduled_pass_waiting_behind_a_manual_one() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let adapter = Arc::new(HoldFirstAdapter {
        calls: AtomicUsize::new(0),
        started: started.clone(),
        release: release.clone(),
    });
    let as_source: Arc<dyn SourceAdapter> = adapter.clone();
    let m = monitor(vec![as_source], Duration::from_secs(3600));
    let (sink, mut rx) = ChannelSink::pair(16);
    m.registry().register(Box::new(sink));

    let manual = {
        let m = m.clone();
        tokio::spawn(async move { m.trigger().await })
    };
    started.notified().await;

    // the immediate scheduled pass now queues on the tick guard
    assert!(m.start());
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(m.stop());

    release.notify_one();
    assert!(manual.await.expect("trigger task").is_some());
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    assert!(matches!(rx.recv().await, Some(LiveEvent::StatsUpdate { .. })));
    assert!(rx.try_recv().is_err(), "no broadcast after stop");
}

#[test]
fn oversized_interval_is_capped() {
    let store: Arc<dyn ArticleStore> = Arc::new(MemoryArticleStore::new());
    let ingestor = Ingestor::new(Arc::new(NewsAnalyzer::default()), store);
    let m = LiveMonitor::new(ingestor, vec![], Arc::new(SubscriberRegistry::new()), u64::MAX);
    assert_eq!(m.interval_minutes(), 1440);
}

#[tokio::test]
async fn connected_event_reports_interval_and_totals() {
    let m = monitor(vec![], Duration::from_secs(300));
    match m.connected_event() {
        LiveEvent::Connected {
            interval_minutes,
            total_processed,
            ..
        } => {
            assert_eq!(interval_minutes, 5);
            assert_eq!(total_processed, 0);
        }
        other => panic!("unexpected {other:?}"),
    }
    let v = serde_json::to_value(m.stats_event()).unwrap();
    assert_eq!(v["type"], "stats");
    assert_eq!(v["subscribers"], 0);
}
