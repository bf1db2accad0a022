// src/ingest/coordinator.rs
//! Fetch → dedup → analyze → store, per source adapter.
//!
//! [`Ingestor`] is the shared pass used by batch jobs and by the live monitor.
//! [`BatchCoordinator`] wraps it with job bookkeeping and background execution.

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::analyze::text::fingerprint;
use crate::analyze::NewsAnalyzer;
use crate::error::PipelineError;
use crate::ingest::ensure_metrics_described;
use crate::ingest::jobs::{JobRegistry, Progress};
use crate::ingest::types::{FetchQuery, RawArticle, SourceAdapter, SourceType};
use crate::store::{ArticleStore, StoredArticle};

pub const DEFAULT_MAX_ARTICLES: usize = 100;
pub const MAX_ARTICLES_LIMIT: usize = 1000;

/// Body of `POST /api/ingest/batch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRequest {
    /// `newsapi` | `gdelt` | `rss` | `all`
    #[serde(default = "default_selector")]
    pub source_type: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub max_articles: Option<usize>,
}

fn default_selector() -> String {
    "all".to_string()
}

impl Default for IngestRequest {
    fn default() -> Self {
        Self {
            source_type: default_selector(),
            keywords: Vec::new(),
            date_from: None,
            date_to: None,
            max_articles: None,
        }
    }
}

impl IngestRequest {
    pub fn query(&self, cap: usize) -> FetchQuery {
        FetchQuery {
            keywords: self.keywords.clone(),
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
            max_articles: self
                .max_articles
                .unwrap_or(DEFAULT_MAX_ARTICLES)
                .clamp(1, cap.clamp(1, MAX_ARTICLES_LIMIT)),
        }
    }
}

/// What happened to one fetched article.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Stored(Box<StoredArticle>),
    Skipped,
    Failed(PipelineError),
}

/// Totals of one pass over one or more adapters.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub progress: Progress,
    pub stored: Vec<StoredArticle>,
    pub source_errors: usize,
}

#[derive(Clone)]
pub struct Ingestor {
    analyzer: Arc<NewsAnalyzer>,
    store: Arc<dyn ArticleStore>,
}

impl Ingestor {
    pub fn new(analyzer: Arc<NewsAnalyzer>, store: Arc<dyn ArticleStore>) -> Self {
        ensure_metrics_described();
        Self { analyzer, store }
    }

    pub fn store(&self) -> &Arc<dyn ArticleStore> {
        &self.store
    }

    pub fn analyzer(&self) -> &Arc<NewsAnalyzer> {
        &self.analyzer
    }

    /// Dedup by URL, analyze, store. Never panics on bad input; failures come back as values.
    pub async fn process(&self, article: RawArticle) -> Outcome {
        if let Some(url) = article.url.as_deref() {
            match self.store.get_by_url(url).await {
                Ok(Some(_)) => return Outcome::Skipped,
                Ok(None) => {}
                Err(e) => return Outcome::Failed(e),
            }
        }

        let t0 = Instant::now();
        let analyzed = self.analyzer.analyze(
            &article.headline,
            &article.content,
            &article.source,
            article.published_at.as_deref(),
        );
        histogram!("analyze_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let record = match analyzed {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(
                    target: "ingest",
                    id = %fingerprint(&article.headline),
                    source = %article.source,
                    error = %e,
                    "article rejected"
                );
                return Outcome::Failed(e);
            }
        };

        match self.store.create(article, record).await {
            Ok(row) => Outcome::Stored(Box::new(row)),
            Err(e) if e.is_benign() => Outcome::Skipped,
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, "store create failed");
                Outcome::Failed(e)
            }
        }
    }

    /// Run `adapters` in order. `tag` overrides each article's source type. `on_progress` sees
    /// the running totals after every article. The store is flushed after each source.
    pub async fn pass(
        &self,
        adapters: &[Arc<dyn SourceAdapter>],
        query: &FetchQuery,
        tag: Option<SourceType>,
        mut on_progress: impl FnMut(&Progress) + Send,
    ) -> PassReport {
        let mut report = PassReport::default();

        for adapter in adapters {
            let articles = match adapter.fetch(query).await {
                Ok(v) => v,
                Err(e) => {
                    let err = PipelineError::SourceUnavailable {
                        adapter: adapter.name().to_string(),
                        reason: format!("{e:#}"),
                    };
                    tracing::warn!(target: "ingest", adapter = adapter.name(), error = %err, "source unavailable");
                    counter!("ingest_source_errors_total", "source" => adapter.name()).increment(1);
                    report.source_errors += 1;
                    continue;
                }
            };

            counter!("ingest_articles_fetched_total", "source" => adapter.name())
                .increment(articles.len() as u64);
            report.progress.total_articles += articles.len();
            on_progress(&report.progress);

            for mut article in articles {
                if let Some(t) = tag {
                    article.source_type = t;
                }
                match self.process(article).await {
                    Outcome::Stored(row) => {
                        report.progress.processed += 1;
                        report.stored.push(*row);
                        counter!("ingest_articles_stored_total").increment(1);
                    }
                    Outcome::Skipped => {
                        report.progress.skipped += 1;
                        counter!("ingest_articles_skipped_total").increment(1);
                    }
                    Outcome::Failed(_) => {
                        report.progress.failed += 1;
                        counter!("ingest_articles_failed_total").increment(1);
                    }
                }
                on_progress(&report.progress);
            }

            if let Err(e) = self.store.flush().await {
                tracing::error!(target: "ingest", adapter = adapter.name(), error = %e, "store flush failed");
            }
            tracing::info!(
                target: "ingest",
                adapter = adapter.name(),
                total = report.progress.total_articles,
                processed = report.progress.processed,
                skipped = report.progress.skipped,
                failed = report.progress.failed,
                "source pass finished"
            );
        }
        report
    }
}

pub struct BatchCoordinator {
    ingestor: Ingestor,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    jobs: Arc<JobRegistry>,
    max_articles: usize,
}

impl BatchCoordinator {
    pub fn new(
        ingestor: Ingestor,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        jobs: Arc<JobRegistry>,
    ) -> Self {
        Self {
            ingestor,
            adapters,
            jobs,
            max_articles: MAX_ARTICLES_LIMIT,
        }
    }

    /// Upper bound applied to every request's `max_articles`.
    pub fn with_max_articles(mut self, cap: usize) -> Self {
        self.max_articles = cap.clamp(1, MAX_ARTICLES_LIMIT);
        self
    }

    pub fn jobs(&self) -> &Arc<JobRegistry> {
        &self.jobs
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    pub fn adapters(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.adapters
    }

    /// Adapters matching `selector` (`all` or an adapter name), in registration order.
    pub fn select(&self, selector: &str) -> Vec<Arc<dyn SourceAdapter>> {
        let sel = selector.trim().to_ascii_lowercase();
        self.adapters
            .iter()
            .filter(|a| sel == "all" || a.name() == sel)
            .cloned()
            .collect()
    }

    /// Record a pending job and run it in the background. Returns the job id immediately.
    pub fn submit(self: &Arc<Self>, request: IngestRequest) -> String {
        let job_id = self.jobs.create(&request.source_type);
        let this = Arc::clone(self);
        let id = job_id.clone();
        let handle = tokio::spawn(async move { this.run(&id, request).await });

        let jobs = Arc::clone(&self.jobs);
        let id = job_id.clone();
        tokio::spawn(async move {
            if let Err(e) = handle.await {
                tracing::error!(target: "ingest", job_id = %id, error = %e, "ingest job task died");
                jobs.fail(&id, format!("job task aborted: {e}"));
            }
        });
        job_id
    }

    /// Run a registered job to completion.
    pub async fn run(&self, job_id: &str, request: IngestRequest) -> PassReport {
        self.jobs.mark_processing(job_id);

        let adapters = self.select(&request.source_type);
        if adapters.is_empty() {
            let msg = format!("no adapter matches source {:?}", request.source_type);
            tracing::warn!(target: "ingest", job_id, "{msg}");
            self.jobs.fail(job_id, msg);
            return PassReport::default();
        }

        let query = request.query(self.max_articles);
        let jobs = Arc::clone(&self.jobs);
        let report = self
            .ingestor
            .pass(&adapters, &query, None, |p| jobs.update_progress(job_id, *p))
            .await;

        self.jobs.complete(job_id);
        tracing::info!(
            target: "ingest",
            job_id,
            processed = report.progress.processed,
            skipped = report.progress.skipped,
            failed = report.progress.failed,
            source_errors = report.source_errors,
            "ingest job completed"
        );
        report
    }
}
