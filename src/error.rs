// src/error.rs
//! Error taxonomy shared by the analysis pipeline, the article store, ingestion and live fanout.
//!
//! Classification stages never produce errors; only the orchestrator's input validation and the
//! infrastructure around it do. Callers decide which variants are benign (`DuplicateUrl`,
//! `SubscriberUnreachable`) and which surface to clients (`InvalidInput`, `JobNotFound`).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Headline or content too short. Caller's fault.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// URL already stored; ingestion treats this as a skip.
    #[error("article with url {0} already exists")]
    DuplicateUrl(String),

    #[error("source {adapter} unavailable: {reason}")]
    SourceUnavailable { adapter: String, reason: String },

    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("subscriber {0} unreachable")]
    SubscriberUnreachable(u64),

    #[error("job {0} not found")]
    JobNotFound(String),
}

impl PipelineError {
    /// Errors that must not count as failures in ingestion bookkeeping.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            PipelineError::DuplicateUrl(_) | PipelineError::SubscriberUnreachable(_)
        )
    }
}
