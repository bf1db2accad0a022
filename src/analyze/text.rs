// src/analyze/text.rs
//! Text helpers shared by the pipeline stages: keyword matching, sentence segmentation and the
//! advisory-language filter.

/// Terms that would make an output read as investment advice (case-insensitive substrings).
pub const ADVISORY_TERMS: [&str; 5] = ["buy", "sell", "recommend", "invest in", "purchase"];

/// Tokens that end in a period without ending a sentence (compared lower-case, final dot removed).
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "inc", "corp", "ltd", "co", "vs", "etc",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "no",
    "u.s", "u.k", "e.g", "i.e", "a.m", "p.m",
];

/// Headline and content joined by a space, lower-cased.
pub fn lower_concat(headline: &str, content: &str) -> String {
    format!("{headline} {content}").to_lowercase()
}

pub fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

/// Number of distinct keywords present at least once.
pub fn count_present(text: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|k| text.contains(k.as_str())).count()
}

/// Non-overlapping occurrences of `keyword` in `text`.
pub fn count_occurrences(text: &str, keyword: &str) -> usize {
    if keyword.is_empty() {
        return 0;
    }
    text.matches(keyword).count()
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Short SHA-256 fingerprint used in logs in place of raw article text.
pub fn fingerprint(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub fn is_advisory(text: &str) -> bool {
    let lower = text.to_lowercase();
    ADVISORY_TERMS.iter().any(|t| lower.contains(t))
}

/// Rule-based sentence segmentation.
///
/// A sentence ends at `.`, `!` or `?` (plus any trailing closing quotes/brackets) followed by
/// whitespace or the end of text, unless the period closes a known abbreviation or a single
/// capital initial. Text after the last terminator forms a final sentence. Returns `None` when
/// nothing but whitespace is present.
pub fn split_sentences(text: &str) -> Option<Vec<String>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j].1, '"' | '\'' | ')' | ']' | '.' | '!' | '?')
            {
                j += 1;
            }
            let at_boundary = j == chars.len() || chars[j].1.is_whitespace();
            let abbreviated = c == '.' && ends_with_abbreviation(&text[start..pos]);
            if at_boundary && !abbreviated {
                let end = if j == chars.len() {
                    text.len()
                } else {
                    chars[j].0
                };
                push_trimmed(&mut out, &text[start..end]);
                start = end;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    push_trimmed(&mut out, &text[start..]);

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Fallback segmentation: plain period split.
pub fn split_on_periods(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sentences of `text`, degrading to the period split when segmentation finds nothing.
pub fn sentences_or_fallback(text: &str) -> Vec<String> {
    split_sentences(text).unwrap_or_else(|| split_on_periods(text))
}

fn push_trimmed(out: &mut Vec<String>, s: &str) {
    let t = s.trim();
    if !t.is_empty() {
        out.push(t.to_string());
    }
}

fn ends_with_abbreviation(prefix: &str) -> bool {
    let token = prefix
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(['(', '"', '\'', '[']);
    if token.is_empty() {
        return false;
    }
    let mut cs = token.chars();
    if let (Some(first), None) = (cs.next(), cs.next()) {
        if first.is_uppercase() {
            return true;
        }
    }
    let lower = token.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}
