//! Source adapters: one uniform interface over heterogeneous site
//! structures, selected by configuration. Most sources run on the
//! selector-driven generic adapter; the WordPress family gets a dedicated
//! implementation with theme presets and fallback heuristics.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use veille_core::types::{AdapterKind, ArticleStub, Category, Source};
use veille_core::{Error, Result};

use crate::fetch::Fetcher;

pub mod generic;
pub mod wordpress;

pub use generic::GenericAdapter;
pub use wordpress::WordPressAdapter;

/// What the content extractor pulls out of one article page. Relevance and
/// summary are computed later by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub title: String,
    pub content: String,
    pub published_at: Option<NaiveDateTime>,
    /// In-page category, when the page exposes one.
    pub category: Option<String>,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Retrieves one category listing page and extracts article stubs.
    async fn list_stubs(&self, fetcher: &Fetcher, category: &Category) -> Result<Vec<ArticleStub>>;

    /// Retrieves one article page and extracts its normalized content.
    async fn extract(&self, fetcher: &Fetcher, link: &str) -> Result<Extracted>;
}

/// Builds the adapter configured for a source. A bad selector set fails the
/// source here, before any fetch happens.
pub fn adapter_for(source: &Source) -> Result<Box<dyn SourceAdapter>> {
    match source.adapter {
        AdapterKind::Generic => Ok(Box::new(GenericAdapter::new(source)?)),
        AdapterKind::Wordpress => Ok(Box::new(WordPressAdapter::new(source)?)),
    }
}

pub(crate) fn compile_selector(name: &str, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| Error::Config(format!("invalid {} selector {:?}: {}", name, css, e)))
}

pub(crate) fn absolutize(base: &Url, href: &str) -> Result<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Ok(href.to_string());
    }
    base.join(href)
        .map(|u| u.to_string())
        .map_err(|e| Error::Parse(format!("cannot resolve link {:?}: {}", href, e)))
}

pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    veille_core::text::collapse_whitespace(&el.text().collect::<String>())
}

/// Raw date of a listing block or article page: prefer the machine-readable
/// `datetime` attribute over the visible text.
pub(crate) fn raw_date_of(el: ElementRef<'_>) -> Option<String> {
    let raw = el
        .value()
        .attr("datetime")
        .map(str::to_string)
        .unwrap_or_else(|| element_text(el));
    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

pub(crate) fn meta_content(document: &Html, property: &str) -> Option<String> {
    let css = format!("meta[property='{}']", property);
    let selector = Selector::parse(&css).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)Followers\s*Subscribers\s*Followers?",
        // The platform tail is required: bare "partager"/"share" is
        // legitimate prose.
        r"(?i)Partager\s*(sur\s*)?(Facebook|Twitter|WhatsApp|LinkedIn|Email)",
        r"(?i)Share\s*(on\s*)?(Facebook|Twitter|WhatsApp|LinkedIn|Email)",
        r"(?i)Lire aussi\s*:[^.]*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Strips share-bar and cross-link artifacts the content selectors drag in.
pub(crate) fn strip_boilerplate(text: &str) -> String {
    let mut cleaned = text.to_string();
    for pattern in BOILERPLATE.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    veille_core::text::collapse_whitespace(&cleaned)
}

/// Text of an element with scripts, styles and share widgets excluded:
/// paragraph nodes when the element has any, full text otherwise.
pub(crate) fn content_text(el: ElementRef<'_>) -> String {
    static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

    let paragraphs: Vec<String> = el
        .select(&PARAGRAPHS)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();

    let raw = if paragraphs.is_empty() {
        element_text(el)
    } else {
        paragraphs.join("\n")
    };
    strip_boilerplate(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize() {
        let base = Url::parse("https://guineenews.org").unwrap();
        assert_eq!(
            absolutize(&base, "/politique/article").unwrap(),
            "https://guineenews.org/politique/article"
        );
        assert_eq!(
            absolutize(&base, "https://autre.com/x").unwrap(),
            "https://autre.com/x"
        );
    }

    #[test]
    fn test_strip_boilerplate() {
        let text = "Le scrutin approche. Partager sur Facebook Lire aussi : notre dossier. Fin.";
        let cleaned = strip_boilerplate(text);
        assert!(cleaned.contains("Le scrutin approche."));
        assert!(!cleaned.contains("Partager"));
        assert!(!cleaned.contains("notre dossier"));
    }

    #[test]
    fn test_strip_boilerplate_keeps_prose_uses_of_partager() {
        let text = "Le candidat veut partager sa vision avec les électeurs.";
        assert_eq!(strip_boilerplate(text), text);
    }

    #[test]
    fn test_raw_date_prefers_datetime_attribute() {
        let html = Html::parse_fragment(
            r#"<time datetime="2026-03-14T08:00:00+00:00">14 mars 2026</time>"#,
        );
        let sel = Selector::parse("time").unwrap();
        let el = html.select(&sel).next().unwrap();
        assert_eq!(raw_date_of(el).unwrap(), "2026-03-14T08:00:00+00:00");
    }
}
