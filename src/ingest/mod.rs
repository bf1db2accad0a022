// src/ingest/mod.rs
pub mod config;
pub mod coordinator;
pub mod jobs;
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// Longest text kept from a source item.
const MAX_TEXT_CHARS: usize = 20_000;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_articles_fetched_total",
            "Articles returned by source adapters."
        );
        describe_counter!(
            "ingest_articles_stored_total",
            "Articles analyzed and stored."
        );
        describe_counter!(
            "ingest_articles_skipped_total",
            "Articles skipped because their URL was already stored."
        );
        describe_counter!(
            "ingest_articles_failed_total",
            "Articles rejected by validation or storage."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source adapter fetch/parse errors."
        );
        describe_histogram!(
            "analyze_duration_ms",
            "Analysis time per article in milliseconds."
        );
        describe_counter!("live_ticks_total", "Live monitor passes.");
        describe_counter!(
            "live_subscribers_pruned_total",
            "Live subscribers removed after a failed delivery."
        );
        describe_gauge!("live_last_tick_ts", "Unix ts of the last live monitor pass.");
    });
}

/// Normalize source text: decode entities, strip tags, ASCII quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) “ ” « » and ‘ ’ to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }
    out
}

/// Case-insensitive keyword post-filter. No keywords keeps everything.
pub fn matches_keywords(text: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let lower = text.to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .any(|k| !k.is_empty() && lower.contains(&k))
}
