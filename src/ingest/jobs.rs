// src/ingest/jobs.rs
//! In-memory registry of batch ingestion jobs.
//!
//! Status only moves forward (pending → processing → completed | failed). At most `retention`
//! terminal jobs are kept; the oldest terminal job is evicted first and active jobs never are.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub const DEFAULT_RETENTION: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionJob {
    pub job_id: String,
    pub status: JobStatus,
    pub source_type: String,
    pub total_articles: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Progress counters reported by a running pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub total_articles: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<String, IngestionJob>,
    terminal_order: VecDeque<String>,
}

#[derive(Debug)]
pub struct JobRegistry {
    inner: Mutex<Inner>,
    retention: usize,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl JobRegistry {
    pub fn with_retention(retention: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            retention: retention.max(1),
        }
    }

    /// Register a new pending job and return its id.
    pub fn create(&self, source_type: &str) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        let job = IngestionJob {
            job_id: job_id.clone(),
            status: JobStatus::Pending,
            source_type: source_type.to_string(),
            total_articles: 0,
            processed: 0,
            failed: 0,
            skipped: 0,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        self.inner
            .lock()
            .expect("job registry mutex poisoned")
            .jobs
            .insert(job_id.clone(), job);
        job_id
    }

    pub fn get(&self, job_id: &str) -> Option<IngestionJob> {
        self.inner
            .lock()
            .expect("job registry mutex poisoned")
            .jobs
            .get(job_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("job registry mutex poisoned").jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mark_processing(&self, job_id: &str) -> bool {
        self.advance(job_id, JobStatus::Processing, None)
    }

    pub fn update_progress(&self, job_id: &str, p: Progress) {
        let mut inner = self.inner.lock().expect("job registry mutex poisoned");
        if let Some(job) = inner.jobs.get_mut(job_id) {
            if !job.status.is_terminal() {
                job.total_articles = p.total_articles;
                job.processed = p.processed.min(p.total_articles);
                job.failed = p.failed;
                job.skipped = p.skipped;
            }
        }
    }

    pub fn complete(&self, job_id: &str) -> bool {
        self.advance(job_id, JobStatus::Completed, None)
    }

    pub fn fail(&self, job_id: &str, error: impl Into<String>) -> bool {
        self.advance(job_id, JobStatus::Failed, Some(error.into()))
    }

    /// Move forward only; a terminal status is set once. Returns whether the job changed.
    fn advance(&self, job_id: &str, to: JobStatus, error: Option<String>) -> bool {
        let mut inner = self.inner.lock().expect("job registry mutex poisoned");
        let Some(job) = inner.jobs.get_mut(job_id) else {
            return false;
        };
        if job.status.is_terminal() || to <= job.status {
            return false;
        }
        job.status = to;
        if to.is_terminal() {
            job.finished_at = Some(Utc::now());
            job.error = error;
            inner.terminal_order.push_back(job_id.to_string());
            while inner.terminal_order.len() > self.retention {
                if let Some(old) = inner.terminal_order.pop_front() {
                    inner.jobs.remove(&old);
                }
            }
        }
        true
    }
}
