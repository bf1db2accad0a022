// src/analyze/summary.rs
//! Extractive summary from the leading sentences of the content.

use crate::analyze::text::{is_advisory, split_sentences};

pub const MAX_SUMMARY_CHARS: usize = 300;
const LEAD_SENTENCES: usize = 4;
/// Below this length the first fact is appended.
const THIN_SUMMARY_CHARS: usize = 100;
pub const UNAVAILABLE: &str = "Summary unavailable.";

pub fn summarize(headline: &str, content: &str, facts: &[String]) -> String {
    let lead = split_sentences(content)
        .map(|sentences| lead_summary(&sentences))
        .unwrap_or_default();

    if lead.is_empty() {
        return fallback(headline, facts);
    }

    let mut summary = lead;
    if summary.chars().count() < THIN_SUMMARY_CHARS {
        if let Some(first) = facts.first() {
            let joined = format!("{summary} {first}");
            if !is_advisory(&joined) {
                summary = joined;
            }
        }
    }
    summary
}

fn lead_summary(sentences: &[String]) -> String {
    let mut out = String::new();
    let mut len = 0usize;
    for s in sentences.iter().take(LEAD_SENTENCES) {
        if is_advisory(s) {
            continue;
        }
        let n = s.chars().count();
        let added = if out.is_empty() { n } else { n + 1 };
        if len + added >= MAX_SUMMARY_CHARS {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(s);
        len += added;
    }
    out
}

fn fallback(headline: &str, facts: &[String]) -> String {
    let headline = headline.trim();
    if is_advisory(headline) || headline.is_empty() {
        return facts
            .first()
            .cloned()
            .unwrap_or_else(|| UNAVAILABLE.to_string());
    }
    match facts.first() {
        Some(first) => {
            let joined = format!("{headline} {first}");
            if is_advisory(&joined) {
                first.clone()
            } else {
                joined
            }
        }
        None => headline.chars().take(MAX_SUMMARY_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn takes_leading_sentences_and_appends_a_fact_when_thin() {
        let s = summarize(
            "Headline here",
            "Stocks rose. Bonds fell.",
            &facts(&["The index closed at 5,000 points after the session."]),
        );
        assert_eq!(
            s,
            "Stocks rose. Bonds fell. The index closed at 5,000 points after the session."
        );
    }

    #[test]
    fn thin_summary_gets_the_first_fact_even_if_already_quoted() {
        let fact = "Revenue rose 8% to $2 billion.";
        let s = summarize("Headline here", fact, &facts(&[fact]));
        assert_eq!(s, format!("{fact} {fact}"));
    }

    #[test]
    fn stops_before_crossing_the_length_limit() {
        let long = "x".repeat(290);
        let content = format!("First sentence is short. {long}. Third one here.");
        let s = summarize("Headline", &content, &[]);
        assert_eq!(s, "First sentence is short.");
    }

    #[test]
    fn only_the_first_four_sentences_are_considered() {
        let s = summarize("Headline", "One. Two. Three. Four. Five.", &[]);
        assert_eq!(s, "One. Two. Three. Four.");
    }

    #[test]
    fn advisory_sentences_are_skipped_but_counted() {
        let s = summarize(
            "Headline",
            "Profits rose. Analysts say buy now. Costs fell. Margins grew. Cash rose.",
            &[],
        );
        assert_eq!(s, "Profits rose. Costs fell. Margins grew.");
        assert!(!is_advisory(&s));
    }

    #[test]
    fn fallbacks_when_no_sentence_survives() {
        let f = facts(&["Output rose 4% over the prior quarter."]);
        assert_eq!(
            summarize("Output climbs", "Time to buy.", &f),
            "Output climbs Output rose 4% over the prior quarter."
        );
        assert_eq!(summarize("Output climbs", "   ", &[]), "Output climbs");
        assert_eq!(
            summarize("Sell everything", "   ", &f),
            "Output rose 4% over the prior quarter."
        );
        assert_eq!(summarize("Sell everything", "   ", &[]), UNAVAILABLE);
    }
}
