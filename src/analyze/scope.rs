// src/analyze/scope.rs
//! Scope classification: Global → Company → Sector → Country, falling back to Global.

use crate::analyze::text::contains_any;
use crate::analyze::types::Scope;
use crate::lexicon::Lexicon;

/// Classify `text` (lower-cased headline + content). Total: always returns a label.
pub fn classify(lexicon: &Lexicon, text: &str) -> Scope {
    let kw = &lexicon.keywords;
    let countries = lexicon.countries_in(text);

    if contains_any(text, &kw.scope.global) && countries.len() >= 2 {
        return Scope::Global;
    }
    if contains_any(text, &kw.company_indicators) {
        return Scope::Company;
    }
    if contains_any(text, &kw.scope.sector) {
        return Scope::Sector;
    }
    if !countries.is_empty() || contains_any(text, &kw.scope.country) {
        return Scope::Country;
    }
    // No signal: the conservative default.
    Scope::Global
}
