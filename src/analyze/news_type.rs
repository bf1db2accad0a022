// src/analyze/news_type.rs
//! News-type classification by weighted keyword presence.
//!
//! Each keyword present in the text scores 2 when it also appears in the headline, else 1.
//! The highest score wins; ties go to the earlier bucket in [`NewsType::ORDER`]
//! (Macro, Earnings, Policy, Geopolitical, Corporate, Sentiment). No signal → Sentiment.

use crate::analyze::types::NewsType;
use crate::lexicon::{Keywords, Lexicon};

pub fn classify(lexicon: &Lexicon, text: &str, headline_lower: &str) -> NewsType {
    let mut best: Option<(NewsType, u32)> = None;
    for t in NewsType::ORDER {
        let score = score_bucket(bucket(&lexicon.keywords, t), text, headline_lower);
        if score > 0 && best.map_or(true, |(_, s)| score > s) {
            best = Some((t, score));
        }
    }
    best.map(|(t, _)| t).unwrap_or(NewsType::Sentiment)
}

/// Per-bucket scores in [`NewsType::ORDER`]; useful for diagnostics.
pub fn scores(lexicon: &Lexicon, text: &str, headline_lower: &str) -> [(NewsType, u32); 6] {
    NewsType::ORDER.map(|t| {
        (
            t,
            score_bucket(bucket(&lexicon.keywords, t), text, headline_lower),
        )
    })
}

fn bucket(kw: &Keywords, t: NewsType) -> &[String] {
    match t {
        NewsType::Macro => &kw.news_type.macro_,
        NewsType::Earnings => &kw.news_type.earnings,
        NewsType::Policy => &kw.news_type.policy,
        NewsType::Geopolitical => &kw.news_type.geopolitical,
        NewsType::Corporate => &kw.news_type.corporate,
        NewsType::Sentiment => &kw.news_type.sentiment,
    }
}

fn score_bucket(keywords: &[String], text: &str, headline_lower: &str) -> u32 {
    keywords
        .iter()
        .filter(|k| text.contains(k.as_str()))
        .map(|k| if headline_lower.contains(k.as_str()) { 2 } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::text::lower_concat;

    fn news_type(h: &str, c: &str) -> NewsType {
        classify(Lexicon::global(), &lower_concat(h, c), &h.to_lowercase())
    }

    #[test]
    fn earnings_and_policy_examples() {
        assert_eq!(
            news_type(
                "Microsoft beats Q4 earnings expectations",
                "Microsoft reported quarterly revenue of $60 billion."
            ),
            NewsType::Earnings
        );
        assert_eq!(
            news_type(
                "Federal Reserve announces interest rate decision",
                "The Federal Reserve announced it will raise interest rates."
            ),
            NewsType::Policy
        );
    }

    #[test]
    fn headline_matches_count_double() {
        // body: one macro keyword (inflation) vs headline policy keyword (tariff) = 2
        assert_eq!(
            news_type("New tariff announced", "Officials cited inflation."),
            NewsType::Policy
        );
    }

    #[test]
    fn ties_go_to_the_earlier_bucket() {
        // gdp (Macro) and sanctions (Geopolitical), both body-only → 1:1 → Macro first
        assert_eq!(
            news_type("Officials meet today", "They discussed gdp and sanctions."),
            NewsType::Macro
        );
        // revenue (Earnings) vs merger (Corporate) → Earnings first
        assert_eq!(
            news_type("Officials meet today", "A merger lifted revenue."),
            NewsType::Earnings
        );
    }

    #[test]
    fn no_signal_defaults_to_sentiment() {
        assert_eq!(
            news_type("Nothing to see here", "Plain words only."),
            NewsType::Sentiment
        );
    }

    #[test]
    fn scores_follow_fixed_order() {
        let lx = Lexicon::global();
        let s = scores(lx, "gdp", "");
        assert_eq!(s[0], (NewsType::Macro, 1));
        assert_eq!(s[5].0, NewsType::Sentiment);
    }
}
