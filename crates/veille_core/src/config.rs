//! YAML configuration loading for sources and keyword groups.
//!
//! A schema error in one entry excludes that entry with a warning; only an
//! unreadable or unparseable file fails the load as a whole.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::score::{KeywordGroup, KeywordSet};
use crate::types::Source;
use crate::{Error, Result};

/// Tunables for the fetch layer and the pipeline, with the original
/// deployment's defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Minimum delay between two requests to the same host, in milliseconds.
    pub delay_ms: u64,
    /// Retry budget for transient fetch failures.
    pub max_retries: u32,
    /// Bound on concurrent outbound article fetches.
    pub max_concurrent_fetches: usize,
    /// Listing cap per category page.
    pub max_articles_per_category: usize,
    pub summary_max_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            timeout_secs: 30,
            delay_ms: 2000,
            max_retries: 3,
            max_concurrent_fetches: 4,
            max_articles_per_category: 30,
            summary_max_len: 300,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    scraping: Settings,
    #[serde(default)]
    sources: Vec<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
struct KeywordsFile {
    #[serde(default)]
    keywords: BTreeMap<String, KeywordGroupEntry>,
}

#[derive(Debug, Deserialize)]
struct KeywordGroupEntry {
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default)]
    terms: Vec<String>,
}

fn default_weight() -> f64 {
    1.0
}

/// Loads source definitions plus scraping settings. Invalid entries are
/// skipped, never fatal to the run.
pub fn load_sources(path: &Path) -> Result<(Vec<Source>, Settings)> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let file: SourcesFile = serde_yaml::from_str(&raw)
        .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;

    let mut sources = Vec::new();
    for value in file.sources {
        match serde_yaml::from_value::<Source>(value) {
            Ok(source) => match validate_source(&source) {
                Ok(()) => sources.push(source),
                Err(e) => warn!("⚠️ skipping source {}: {}", source.name, e),
            },
            Err(e) => warn!("⚠️ skipping malformed source entry: {}", e),
        }
    }

    Ok((sources, file.scraping))
}

fn validate_source(source: &Source) -> Result<()> {
    if source.name.trim().is_empty() {
        return Err(Error::Config("source name is empty".to_string()));
    }
    Url::parse(&source.base_url)
        .map_err(|e| Error::Config(format!("malformed base_url {}: {}", source.base_url, e)))?;
    if source.categories.is_empty() {
        return Err(Error::Config("no category URLs configured".to_string()));
    }
    for category in &source.categories {
        Url::parse(&category.url).map_err(|e| {
            Error::Config(format!("malformed category URL {}: {}", category.url, e))
        })?;
    }
    Ok(())
}

/// Loads the keyword groups; reloadable independently of the sources file.
pub fn load_keywords(path: &Path) -> Result<KeywordSet> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    let file: KeywordsFile = serde_yaml::from_str(&raw)
        .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;

    let mut groups = Vec::new();
    for (name, entry) in file.keywords {
        if entry.terms.is_empty() {
            warn!("⚠️ keyword group {} has no terms, skipping", name);
            continue;
        }
        groups.push(KeywordGroup {
            name,
            weight: entry.weight,
            terms: entry.terms,
        });
    }

    Ok(KeywordSet { groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AdapterKind;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_sources_skips_invalid_entries() {
        let path = write_temp(
            r#"
scraping:
  max_concurrent_fetches: 2
sources:
  - name: Guineenews
    base_url: https://guineenews.org
    adapter: wordpress
    site: guineenews
    categories:
      - url: https://guineenews.org/category/politique/
        label: Politique
  - name: Broken
    base_url: "not a url"
    categories:
      - url: https://example.com/a
        label: A
  - name: NoCategories
    base_url: https://example.com
"#,
        );
        let (sources, settings) = load_sources(path.path()).unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Guineenews");
        assert_eq!(sources[0].adapter, AdapterKind::Wordpress);
        assert!(sources[0].active);
        assert_eq!(settings.max_concurrent_fetches, 2);
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn test_load_sources_missing_file_is_config_error() {
        let err = load_sources(Path::new("/nonexistent/sources.yaml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_keywords() {
        let path = write_temp(
            r#"
keywords:
  election:
    weight: 1.0
    terms: ["élection", "scrutin"]
  vide:
    terms: []
"#,
        );
        let keywords = load_keywords(path.path()).unwrap();

        assert_eq!(keywords.groups.len(), 1);
        assert_eq!(keywords.groups[0].name, "election");
        assert_eq!(keywords.groups[0].terms.len(), 2);
    }
}
