// src/analyze/facts.rs
//! Fact extraction: sentences that state something (indicator verb or a number) without
//! speculation, questions or advisory language.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyze::text::{collapse_whitespace, contains_any, is_advisory, sentences_or_fallback};
use crate::lexicon::Lexicon;

pub const MAX_FACTS: usize = 10;
/// Cleaned facts of this many characters or fewer are dropped.
const MIN_FACT_CHARS: usize = 20;

static RE_ATTRIBUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)according to [^,.]+[,.]").expect("attribution regex"));

pub fn extract(lexicon: &Lexicon, content: &str) -> Vec<String> {
    sentences_or_fallback(content)
        .iter()
        .filter(|s| is_fact(lexicon, s))
        .filter_map(|s| clean(s))
        .take(MAX_FACTS)
        .collect()
}

fn is_fact(lexicon: &Lexicon, sentence: &str) -> bool {
    let trimmed = sentence.trim_end();
    if trimmed.ends_with('?') || is_advisory(trimmed) {
        return false;
    }
    let lower = trimmed.to_lowercase();
    let stated = contains_any(&lower, &lexicon.keywords.fact_indicators)
        || lower.chars().any(|c| c.is_ascii_digit());
    stated && !lexicon.is_speculative(&lower)
}

fn clean(sentence: &str) -> Option<String> {
    let mut s = with_period(collapse_whitespace(sentence));
    if !s.contains('"') {
        let stripped = RE_ATTRIBUTION.replace_all(&s, "");
        if let std::borrow::Cow::Owned(o) = stripped {
            s = with_period(collapse_whitespace(o.trim_end_matches([' ', ',', ';'])));
        }
    }
    (s.chars().count() > MIN_FACT_CHARS).then_some(s)
}

fn with_period(mut s: String) -> String {
    if !s.is_empty() && !s.ends_with(['.', '!', '"', '\'']) {
        s.push('.');
    }
    s
}
