// src/analyze/entities.rs
//! Entity extraction: countries, sectors and indices from the lexicon; companies from a
//! capitalized-words-plus-suffix heuristic. Low precision; not NER.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyze::text::collapse_whitespace;
use crate::analyze::types::Entities;
use crate::lexicon::Lexicon;

static RE_COMPANY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[A-Z][a-z]+\s+)+(?:Inc|Corp|Ltd|LLC|Plc|AG)\b").expect("company regex")
});

/// `lower_text` is the lower-cased headline + content, `original_text` the same in original case.
pub fn extract(lexicon: &Lexicon, lower_text: &str, original_text: &str) -> Entities {
    Entities {
        countries: capped(lexicon.countries_in(lower_text)),
        sectors: capped(lexicon.sectors_in(lower_text)),
        companies: companies(original_text),
        indices: capped(lexicon.indices_in(lower_text)),
    }
}

fn companies(original_text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in RE_COMPANY.find_iter(original_text) {
        let name = collapse_whitespace(m.as_str());
        if !out.contains(&name) {
            out.push(name);
            if out.len() == Entities::CAP {
                break;
            }
        }
    }
    out
}

fn capped(v: Vec<&str>) -> Vec<String> {
    v.into_iter()
        .take(Entities::CAP)
        .map(str::to_string)
        .collect()
}
