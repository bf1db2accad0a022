// src/analyze/impact.rs
//! Impact estimate: direction from polarity keyword counts, a four-factor confidence score, and a
//! time horizon from horizon phrases with a per-news-type fallback.
//!
//! Direction decision order (thresholds are part of the contract):
//! 1. more than 2 neutral keywords present → Neutral
//! 2. positive > negative × 1.5 → Positive
//! 3. negative > positive × 1.5 → Negative
//! 4. both zero → Unclear
//! 5. otherwise → Neutral
//!
//! Confidence = 0.3·numeric-clarity + 0.3·digit-segments + 0.12 baseline + 0.2·specificity,
//! halved when Unclear, clamped to [0, 1] and rounded to 2 decimals.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyze::text::{count_occurrences, count_present};
use crate::analyze::types::{Direction, Impact, NewsType, TimeHorizon};
use crate::lexicon::Keywords;

const W_CLARITY: f64 = 0.3;
const W_FACTS: f64 = 0.3;
const W_SOURCE: f64 = 0.2;
/// Fixed source-reliability placeholder until per-source scoring exists.
const SOURCE_RELIABILITY: f64 = 0.6;
const W_SPECIFICITY: f64 = 0.2;

static RE_NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\.?\d*%|\$\d+|\d+\s*(?:million|billion|trillion)").expect("numeric regex")
});

pub fn analyze(kw: &Keywords, text: &str, headline_lower: &str, news_type: NewsType) -> Impact {
    let direction = direction(kw, text, headline_lower);
    Impact {
        direction,
        confidence: confidence(kw, text, direction),
        time_horizon: time_horizon(kw, text, news_type),
    }
}

/// Polarity scores: occurrences in the full text plus occurrences in the headline, so headline
/// hits weigh double.
pub fn polarity_scores(kw: &Keywords, text: &str, headline_lower: &str) -> (usize, usize, usize) {
    let weighted = |words: &[String]| -> usize {
        words
            .iter()
            .map(|w| count_occurrences(text, w) + count_occurrences(headline_lower, w))
            .sum()
    };
    (
        weighted(&kw.impact.positive),
        weighted(&kw.impact.negative),
        count_present(text, &kw.impact.neutral),
    )
}

pub fn direction(kw: &Keywords, text: &str, headline_lower: &str) -> Direction {
    let (pos, neg, neutral) = polarity_scores(kw, text, headline_lower);
    decide(pos, neg, neutral)
}

/// The direction decision boundary.
pub fn decide(positive: usize, negative: usize, neutral: usize) -> Direction {
    let (p, n) = (positive as f64, negative as f64);
    if neutral > 2 {
        Direction::Neutral
    } else if p > n * 1.5 {
        Direction::Positive
    } else if n > p * 1.5 {
        Direction::Negative
    } else if positive == 0 && negative == 0 {
        Direction::Unclear
    } else {
        Direction::Neutral
    }
}

pub fn confidence(kw: &Keywords, text: &str, direction: Direction) -> f64 {
    let mut c = raw_confidence(kw, text);
    if direction == Direction::Unclear {
        c *= 0.5;
    }
    round2(c.clamp(0.0, 1.0))
}

fn raw_confidence(kw: &Keywords, text: &str) -> f64 {
    let numbers = RE_NUMERIC.find_iter(text).count() as f64;
    let clarity = (numbers / 3.0).min(1.0) * W_CLARITY;

    let digit_segments = text
        .split('.')
        .filter(|s| s.chars().any(|c| c.is_ascii_digit()))
        .count() as f64;
    let facts = (digit_segments / 5.0).min(1.0) * W_FACTS;

    let source = SOURCE_RELIABILITY * W_SOURCE;

    let specific = count_present(text, &kw.specificity) as f64;
    let specificity = (specific / 3.0).min(1.0) * W_SPECIFICITY;

    clarity + facts + source + specificity
}

pub fn time_horizon(kw: &Keywords, text: &str, news_type: NewsType) -> TimeHorizon {
    let short = count_present(text, &kw.time_horizon.short);
    let medium = count_present(text, &kw.time_horizon.medium);
    let long = count_present(text, &kw.time_horizon.long);

    if long > medium && long > short {
        TimeHorizon::Long
    } else if medium > short {
        TimeHorizon::Medium
    } else if short > 0 {
        TimeHorizon::Short
    } else {
        default_horizon(news_type)
    }
}

fn default_horizon(news_type: NewsType) -> TimeHorizon {
    match news_type {
        NewsType::Earnings | NewsType::Sentiment => TimeHorizon::Short,
        NewsType::Macro | NewsType::Corporate => TimeHorizon::Medium,
        NewsType::Policy | NewsType::Geopolitical => TimeHorizon::Long,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
