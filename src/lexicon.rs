// src/lexicon.rs
//! Lexicon store: countries, sectors, market indices and classification keyword sets.
//!
//! The default lexicon is compiled into the binary from `data/*.json`. A directory with the same
//! four files can replace it at startup (`LEXICON_DIR`). Everything is lower-cased and every
//! word-boundary regex is compiled once on load; analysis only ever reads a `&Lexicon`.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const ENV_LEXICON_DIR: &str = "LEXICON_DIR";

const COUNTRIES_JSON: &str = include_str!("../data/countries.json");
const SECTORS_JSON: &str = include_str!("../data/sectors.json");
const INDICES_JSON: &str = include_str!("../data/indices.json");
const KEYWORDS_JSON: &str = include_str!("../data/keywords.json");

static EMBEDDED: Lazy<Lexicon> =
    Lazy::new(|| Lexicon::embedded().expect("embedded lexicon under data/ is valid"));

// --- raw file shapes ---

#[derive(Debug, Deserialize)]
struct CountryEntry {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SectorEntry {
    name: String,
    keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScopeKeywords {
    pub global: Vec<String>,
    pub country: Vec<String>,
    pub sector: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsTypeKeywords {
    pub macro_: Vec<String>,
    pub earnings: Vec<String>,
    pub policy: Vec<String>,
    pub geopolitical: Vec<String>,
    pub corporate: Vec<String>,
    pub sentiment: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImpactKeywords {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub neutral: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HorizonKeywords {
    pub short: Vec<String>,
    pub medium: Vec<String>,
    pub long: Vec<String>,
}

/// Keyword sets used by the classifiers. Matched as lower-case substrings.
#[derive(Debug, Clone, Deserialize)]
pub struct Keywords {
    pub scope: ScopeKeywords,
    pub company_indicators: Vec<String>,
    pub news_type: NewsTypeKeywords,
    pub impact: ImpactKeywords,
    pub time_horizon: HorizonKeywords,
    pub fact_indicators: Vec<String>,
    pub speculation: Vec<String>,
    pub specificity: Vec<String>,
}

// `macro` is a keyword in Rust; the JSON key stays `macro`.
#[derive(Deserialize)]
struct KeywordsFile {
    scope: ScopeKeywords,
    company_indicators: Vec<String>,
    news_type: NewsTypeFile,
    impact: ImpactKeywords,
    time_horizon: HorizonKeywords,
    fact_indicators: Vec<String>,
    speculation: Vec<String>,
    specificity: Vec<String>,
}

#[derive(Deserialize)]
struct NewsTypeFile {
    #[serde(rename = "macro")]
    macro_: Vec<String>,
    earnings: Vec<String>,
    policy: Vec<String>,
    geopolitical: Vec<String>,
    corporate: Vec<String>,
    sentiment: Vec<String>,
}

// --- compiled lexicon ---

/// A term matched on word boundaries (start/end of text or any non-alphanumeric neighbour).
#[derive(Debug, Clone)]
pub struct BoundedTerm {
    pub label: String,
    re: Regex,
}

impl BoundedTerm {
    pub fn new(label: &str, term: &str) -> Result<Self> {
        let re = bounded_regex(term)?;
        Ok(Self {
            label: label.to_string(),
            re,
        })
    }

    pub fn is_match(&self, lower_text: &str) -> bool {
        self.re.is_match(lower_text)
    }
}

#[derive(Debug, Clone)]
pub struct Country {
    pub name: String,
    terms: Vec<BoundedTerm>,
}

#[derive(Debug, Clone)]
pub struct Sector {
    pub name: String,
    terms: Vec<BoundedTerm>,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    pub countries: Vec<Country>,
    pub sectors: Vec<Sector>,
    pub indices: Vec<BoundedTerm>,
    pub keywords: Keywords,
    speculation: Vec<BoundedTerm>,
}

impl Lexicon {
    /// Process-wide default lexicon (embedded data).
    pub fn global() -> &'static Lexicon {
        &EMBEDDED
    }

    pub fn embedded() -> Result<Self> {
        Self::from_sources(COUNTRIES_JSON, SECTORS_JSON, INDICES_JSON, KEYWORDS_JSON)
    }

    /// Load `countries.json`, `sectors.json`, `indices.json` and `keywords.json` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str| {
            let p = dir.join(name);
            fs::read_to_string(&p).with_context(|| format!("reading lexicon file {}", p.display()))
        };
        Self::from_sources(
            &read("countries.json")?,
            &read("sectors.json")?,
            &read("indices.json")?,
            &read("keywords.json")?,
        )
    }

    /// `$LEXICON_DIR` when set, otherwise a clone of the embedded lexicon.
    pub fn load_default() -> Result<Self> {
        match std::env::var(ENV_LEXICON_DIR) {
            Ok(dir) if !dir.trim().is_empty() => Self::from_dir(Path::new(dir.trim())),
            _ => Ok(Self::global().clone()),
        }
    }

    fn from_sources(countries: &str, sectors: &str, indices: &str, keywords: &str) -> Result<Self> {
        let countries: Vec<CountryEntry> =
            serde_json::from_str(countries).context("parsing countries lexicon")?;
        let sectors: Vec<SectorEntry> =
            serde_json::from_str(sectors).context("parsing sectors lexicon")?;
        let indices: Vec<String> =
            serde_json::from_str(indices).context("parsing indices lexicon")?;
        let kw: KeywordsFile = serde_json::from_str(keywords).context("parsing keyword lexicon")?;

        let countries = countries
            .into_iter()
            .map(|c| {
                let mut terms = vec![BoundedTerm::new(&c.name, &c.name)?];
                for alias in &c.aliases {
                    terms.push(BoundedTerm::new(&c.name, alias)?);
                }
                Ok(Country {
                    name: c.name,
                    terms,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let sectors = sectors
            .into_iter()
            .map(|s| {
                let terms = s
                    .keywords
                    .iter()
                    .map(|k| BoundedTerm::new(&s.name, k))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Sector {
                    name: s.name,
                    terms,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let indices = indices
            .iter()
            .map(|i| BoundedTerm::new(i, i))
            .collect::<Result<Vec<_>>>()?;

        let speculation = kw
            .speculation
            .iter()
            .map(|w| BoundedTerm::new(w, w))
            .collect::<Result<Vec<_>>>()?;

        let keywords = Keywords {
            scope: ScopeKeywords {
                global: lower_all(kw.scope.global),
                country: lower_all(kw.scope.country),
                sector: lower_all(kw.scope.sector),
            },
            company_indicators: lower_all(kw.company_indicators),
            news_type: NewsTypeKeywords {
                macro_: lower_all(kw.news_type.macro_),
                earnings: lower_all(kw.news_type.earnings),
                policy: lower_all(kw.news_type.policy),
                geopolitical: lower_all(kw.news_type.geopolitical),
                corporate: lower_all(kw.news_type.corporate),
                sentiment: lower_all(kw.news_type.sentiment),
            },
            impact: ImpactKeywords {
                positive: lower_all(kw.impact.positive),
                negative: lower_all(kw.impact.negative),
                neutral: lower_all(kw.impact.neutral),
            },
            time_horizon: HorizonKeywords {
                short: lower_all(kw.time_horizon.short),
                medium: lower_all(kw.time_horizon.medium),
                long: lower_all(kw.time_horizon.long),
            },
            fact_indicators: lower_all(kw.fact_indicators),
            speculation: lower_all(kw.speculation),
            specificity: lower_all(kw.specificity),
        };

        Ok(Self {
            countries,
            sectors,
            indices,
            keywords,
            speculation,
        })
    }

    /// Canonical country names present in `lower_text`, unique, in lexicon order.
    pub fn countries_in(&self, lower_text: &str) -> Vec<&str> {
        self.countries
            .iter()
            .filter(|c| c.terms.iter().any(|t| t.is_match(lower_text)))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Sector names with at least one keyword present, unique, in lexicon order.
    pub fn sectors_in(&self, lower_text: &str) -> Vec<&str> {
        self.sectors
            .iter()
            .filter(|s| s.terms.iter().any(|t| t.is_match(lower_text)))
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn indices_in(&self, lower_text: &str) -> Vec<&str> {
        self.indices
            .iter()
            .filter(|i| i.is_match(lower_text))
            .map(|i| i.label.as_str())
            .collect()
    }

    pub fn is_speculative(&self, lower_text: &str) -> bool {
        self.speculation.iter().any(|t| t.is_match(lower_text))
    }
}

fn lower_all(v: Vec<String>) -> Vec<String> {
    v.into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `term` (lower-cased, escaped) with a non-alphanumeric or text edge on both sides.
fn bounded_regex(term: &str) -> Result<Regex> {
    let t = term.trim().to_lowercase();
    anyhow::ensure!(!t.is_empty(), "empty lexicon term");
    let pattern = format!(r"(?:^|[^\p{{L}}\p{{N}}]){}(?:$|[^\p{{L}}\p{{N}}])", regex::escape(&t));
    Regex::new(&pattern).with_context(|| format!("compiling lexicon term {term:?}"))
}
