use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One site-defined content section with its own listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub url: String,
    pub label: String,
}

/// CSS selectors describing one source's HTML structure. Any field left out
/// falls back to the adapter's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorSet {
    pub article_list: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub date: Option<String>,
    pub content: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Generic,
    Wordpress,
}

impl Default for AdapterKind {
    fn default() -> Self {
        AdapterKind::Generic
    }
}

/// One configured news website. Immutable during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub adapter: AdapterKind,
    /// WordPress preset key (theme family), e.g. "ledjely" or "guineematin".
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub selectors: SelectorSet,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_active() -> bool {
    true
}

/// Lightweight reference to a candidate article, produced by the listing
/// pass and discarded after rejection or promotion to a full Article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleStub {
    pub title: String,
    pub link: String,
    pub raw_date: Option<String>,
}

/// Persisted record for one collected article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub published_at: Option<NaiveDateTime>,
    pub source: String,
    pub category: String,
    pub link: String,
    /// Stable identifier derived from the normalized link (sha-256 hex).
    pub guid: String,
    pub tags: Vec<String>,
    pub relevance: f64,
    pub summary: String,
    pub scraped_at: DateTime<Utc>,
}

/// Per-source counters accumulated over one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceReport {
    pub source: String,
    /// Stubs found on listing pages.
    pub fetched: usize,
    /// Stubs rejected by the date window (or undated).
    pub filtered_out: usize,
    pub duplicates: usize,
    pub persisted: usize,
    pub errors: usize,
    /// Set when the source as a whole could not be processed.
    pub fatal: Option<String>,
}

impl SourceReport {
    pub fn new(source: &str) -> Self {
        SourceReport {
            source: source.to_string(),
            ..Default::default()
        }
    }
}

/// Aggregate outcome of one pipeline run, returned by the orchestrator
/// instead of kept as ambient state.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn total_persisted(&self) -> usize {
        self.sources.iter().map(|s| s.persisted).sum()
    }

    pub fn total_duplicates(&self) -> usize {
        self.sources.iter().map(|s| s.duplicates).sum()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.fatal.is_some()).count()
    }

    /// True when every selected source failed outright.
    pub fn all_sources_failed(&self) -> bool {
        !self.sources.is_empty() && self.failed_sources() == self.sources.len()
    }
}
