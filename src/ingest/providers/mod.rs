// src/ingest/providers/mod.rs
pub mod gdelt;
pub mod newsapi;
pub mod rss;

pub use gdelt::GdeltAdapter;
pub use newsapi::NewsApiAdapter;
pub use rss::RssAdapter;
