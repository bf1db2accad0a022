// src/analyze/mod.rs
//! Analysis pipeline: headline + content in, [`IntelligenceRecord`] out.
//!
//! Stages run in a fixed order over the same lower-cased text:
//! 1) scope, 2) news type, 3) entities, 4) impact (horizon falls back on the news type),
//! 5) facts, 6) summary (consumes the facts).
//! Every stage is a total function over a read-only [`Lexicon`]; the only fallible step is input
//! validation.

pub mod entities;
pub mod facts;
pub mod impact;
pub mod news_type;
pub mod scope;
pub mod summary;
pub mod text;
pub mod types;

use std::sync::Arc;

use crate::error::PipelineError;
use crate::lexicon::Lexicon;

pub use crate::analyze::types::{
    Direction, Entities, Impact, IntelligenceRecord, NewsType, Scope, TimeHorizon,
};

pub const MIN_HEADLINE_CHARS: usize = 10;
pub const MIN_CONTENT_CHARS: usize = 50;

/// Stateless analyzer; clone the `Arc` to share it between tasks.
#[derive(Debug, Clone)]
pub struct NewsAnalyzer {
    lexicon: Arc<Lexicon>,
}

impl Default for NewsAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::global().clone()))
    }
}

impl NewsAnalyzer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Run the full pipeline. Same inputs, same record.
    pub fn analyze(
        &self,
        headline: &str,
        content: &str,
        source: &str,
        published_at: Option<&str>,
    ) -> Result<IntelligenceRecord, PipelineError> {
        let headline = headline.trim();
        let content = content.trim();
        validate(headline, content)?;

        let lx = self.lexicon.as_ref();
        let lower = text::lower_concat(headline, content);
        let headline_lower = headline.to_lowercase();

        let scope = scope::classify(lx, &lower);
        let news_type = news_type::classify(lx, &lower, &headline_lower);
        let entities = entities::extract(lx, &lower, &format!("{headline} {content}"));
        let impact = impact::analyze(&lx.keywords, &lower, &headline_lower, news_type);
        let facts = facts::extract(lx, content);
        let summary = summary::summarize(headline, content, &facts);

        Ok(IntelligenceRecord {
            headline: headline.to_string(),
            source: source.trim().to_string(),
            published_at: published_at.map(str::to_string),
            scope,
            news_type,
            entities,
            impact,
            facts,
            summary,
        })
    }
}

fn validate(headline: &str, content: &str) -> Result<(), PipelineError> {
    let h = headline.chars().count();
    if h < MIN_HEADLINE_CHARS {
        return Err(PipelineError::InvalidInput(format!(
            "headline must be at least {MIN_HEADLINE_CHARS} characters (got {h})"
        )));
    }
    let c = content.chars().count();
    if c < MIN_CONTENT_CHARS {
        return Err(PipelineError::InvalidInput(format!(
            "content must be at least {MIN_CONTENT_CHARS} characters (got {c})"
        )));
    }
    Ok(())
}
