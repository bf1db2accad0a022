// src/store/mod.rs
//! Article store: analyzed articles keyed by a store-assigned id, unique by URL.
//!
//! [`MemoryArticleStore`] keeps everything in process memory and can mirror itself to a JSON
//! snapshot file on [`ArticleStore::flush`].

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::analyze::types::{IntelligenceRecord, NewsType, Scope};
use crate::error::PipelineError;
use crate::ingest::types::RawArticle;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: u64,
    pub article: RawArticle,
    pub intelligence: IntelligenceRecord,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing filter. `page` is 1-based; `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFilter {
    pub scope: Option<Scope>,
    pub news_type: Option<NewsType>,
    pub source: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self {
            scope: None,
            news_type: None,
            source: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ArticleFilter {
    fn accepts(&self, a: &StoredArticle) -> bool {
        a.processing_status == ProcessingStatus::Processed
            && self.scope.map_or(true, |s| s == a.intelligence.scope)
            && self.news_type.map_or(true, |t| t == a.intelligence.news_type)
            && self
                .source
                .as_deref()
                .map_or(true, |s| a.article.source.eq_ignore_ascii_case(s))
    }
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert a processed article. A URL that is already stored yields `DuplicateUrl` and
    /// leaves the existing row untouched.
    async fn create(
        &self,
        article: RawArticle,
        intelligence: IntelligenceRecord,
    ) -> Result<StoredArticle, PipelineError>;

    async fn get_by_url(&self, url: &str) -> Result<Option<StoredArticle>, PipelineError>;

    async fn get_by_id(&self, id: u64) -> Result<Option<StoredArticle>, PipelineError>;

    /// Processed articles matching `filter`, newest first, plus the total match count.
    async fn list(
        &self,
        filter: &ArticleFilter,
    ) -> Result<(Vec<StoredArticle>, usize), PipelineError>;

    /// Commit pending writes (batch boundary).
    async fn flush(&self) -> Result<(), PipelineError>;
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<StoredArticle>,
    by_url: HashMap<String, usize>,
    next_id: u64,
}

impl Inner {
    fn from_rows(rows: Vec<StoredArticle>) -> Self {
        let by_url = rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.article.url.clone().map(|u| (u, i)))
            .collect();
        let next_id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            rows,
            by_url,
            next_id,
        }
    }
}

#[derive(Debug)]
pub struct MemoryArticleStore {
    inner: RwLock<Inner>,
    snapshot: Option<PathBuf>,
    // held across write + rename so flushes never share the tmp file
    flush_lock: tokio::sync::Mutex<()>,
}

impl Default for MemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::from_rows(Vec::new())),
            snapshot: None,
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Store mirrored to `path`: loaded now if the file exists, rewritten on every flush.
    pub fn with_snapshot(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let rows: Vec<StoredArticle> = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading snapshot {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing snapshot {}", path.display()))?
        } else {
            Vec::new()
        };
        tracing::info!(target: "store", rows = rows.len(), path = %path.display(), "article store opened");
        Ok(Self {
            inner: RwLock::new(Inner::from_rows(rows)),
            snapshot: Some(path),
            flush_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("store lock poisoned").rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn create(
        &self,
        article: RawArticle,
        intelligence: IntelligenceRecord,
    ) -> Result<StoredArticle, PipelineError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| PipelineError::StorageFailure("store lock poisoned".into()))?;
        if let Some(url) = &article.url {
            if inner.by_url.contains_key(url) {
                return Err(PipelineError::DuplicateUrl(url.clone()));
            }
        }
        let now = Utc::now();
        let row = StoredArticle {
            id: inner.next_id,
            article,
            intelligence,
            processing_status: ProcessingStatus::Processed,
            created_at: now,
            updated_at: now,
        };
        inner.next_id += 1;
        let idx = inner.rows.len();
        if let Some(url) = &row.article.url {
            inner.by_url.insert(url.clone(), idx);
        }
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<StoredArticle>, PipelineError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| PipelineError::StorageFailure("store lock poisoned".into()))?;
        Ok(inner.by_url.get(url).map(|&i| inner.rows[i].clone()))
    }

    async fn get_by_id(&self, id: u64) -> Result<Option<StoredArticle>, PipelineError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| PipelineError::StorageFailure("store lock poisoned".into()))?;
        Ok(inner.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn list(
        &self,
        filter: &ArticleFilter,
    ) -> Result<(Vec<StoredArticle>, usize), PipelineError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| PipelineError::StorageFailure("store lock poisoned".into()))?;
        let mut hits: Vec<&StoredArticle> =
            inner.rows.iter().filter(|r| filter.accepts(r)).collect();
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = hits.len();
        let page = filter.page.max(1);
        let size = filter.page_size.clamp(1, MAX_PAGE_SIZE);
        let items = hits
            .into_iter()
            .skip((page - 1).saturating_mul(size))
            .take(size)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn flush(&self) -> Result<(), PipelineError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let _flushing = self.flush_lock.lock().await;
        let body = {
            let inner = self
                .inner
                .read()
                .map_err(|_| PipelineError::StorageFailure("store lock poisoned".into()))?;
            serde_json::to_vec_pretty(&inner.rows)
                .map_err(|e| PipelineError::StorageFailure(format!("encoding snapshot: {e}")))?
        };
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| PipelineError::StorageFailure(format!("writing {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| PipelineError::StorageFailure(format!("renaming {}: {e}", tmp.display())))?;
        tracing::debug!(target: "store", bytes = body.len(), path = %path.display(), "snapshot flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::NewsAnalyzer;
    use crate::ingest::types::SourceType;

    fn article(url: Option<&str>, headline: &str, source: &str) -> (RawArticle, IntelligenceRecord) {
        let content = "The company reported revenue of $5 billion for the quarter, officials said today.";
        let rec = NewsAnalyzer::default()
            .analyze(headline, content, source, None)
            .unwrap();
        (
            RawArticle {
                headline: headline.into(),
                content: content.into(),
                source: source.into(),
                url: url.map(str::to_string),
                published_at: None,
                source_type: SourceType::Manual,
            },
            rec,
        )
    }

    #[tokio::test]
    async fn ids_start_at_one_and_urls_are_unique() {
        let store = MemoryArticleStore::new();
        let (a, r) = article(Some("https://x.test/1"), "First headline here", "Wire");
        let first = store.create(a.clone(), r.clone()).await.unwrap();
        assert_eq!(first.id, 1);

        let err = store.create(a, r).await.unwrap_err();
        assert_eq!(err, PipelineError::DuplicateUrl("https://x.test/1".into()));
        assert_eq!(store.len(), 1);

        let (b, rb) = article(None, "No url headline", "Wire");
        assert_eq!(store.create(b.clone(), rb.clone()).await.unwrap().id, 2);
        assert_eq!(store.create(b, rb).await.unwrap().id, 3);
    }

    #[tokio::test]
    async fn lookups_by_url_and_id() {
        let store = MemoryArticleStore::new();
        let (a, r) = article(Some("https://x.test/a"), "Lookup headline", "Wire");
        let row = store.create(a, r).await.unwrap();
        assert_eq!(
            store.get_by_url("https://x.test/a").await.unwrap().map(|r| r.id),
            Some(row.id)
        );
        assert!(store.get_by_url("https://x.test/zz").await.unwrap().is_none());
        assert!(store.get_by_id(row.id).await.unwrap().is_some());
        assert!(store.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let store = MemoryArticleStore::new();
        for i in 0..5 {
            let (a, r) = article(Some(&format!("https://x.test/{i}")), "Paged headline", "Wire");
            store.create(a, r).await.unwrap();
        }
        let filter = ArticleFilter {
            page: 1,
            page_size: 2,
            ..Default::default()
        };
        let (items, total) = store.list(&filter).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![5, 4]);

        let last = ArticleFilter {
            page: 3,
            page_size: 2,
            ..Default::default()
        };
        let (items, _) = store.list(&last).await.unwrap();
        assert_eq!(items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);

        let zero = ArticleFilter {
            page: 0,
            page_size: 0,
            ..Default::default()
        };
        let (items, _) = store.list(&zero).await.unwrap();
        assert_eq!(items.len(), 1, "page/page_size are clamped to at least 1");
    }

    #[tokio::test]
    async fn filters_by_source_case_insensitively() {
        let store = MemoryArticleStore::new();
        let (a, r) = article(Some("https://x.test/w"), "Wire headline", "Wire");
        store.create(a, r).await.unwrap();
        let (b, rb) = article(Some("https://x.test/o"), "Other headline", "Other");
        store.create(b, rb).await.unwrap();

        let filter = ArticleFilter {
            source: Some("wire".into()),
            ..Default::default()
        };
        let (items, total) = store.list(&filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].article.source, "Wire");
    }
}
