//! Adapter for the WordPress news sites (Guinée7, Ledjely, Mosaique Guinée,
//! Guinéematin and friends). Theme families share selector presets; pages
//! that deviate from their theme get fallback heuristics.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use veille_core::types::{ArticleStub, Category, Source};
use veille_core::{Error, Result};

use crate::dates::parse_raw_date;
use crate::fetch::Fetcher;
use super::{
    absolutize, compile_selector, content_text, element_text, meta_content, raw_date_of,
    Extracted, SourceAdapter,
};

struct Preset {
    article_list: &'static str,
    title: &'static str,
    date: &'static str,
    content: &'static str,
    tags: &'static str,
}

const DEFAULT_PRESET: Preset = Preset {
    article_list: "article",
    title: "h2 a, h3 a, .entry-title a",
    date: "time[datetime]",
    content: ".entry-content",
    tags: "a[rel='tag']",
};

/// Per-theme selector presets, keyed by the source's `site` field.
fn preset(site: &str) -> Preset {
    match site {
        "guinee7" => Preset {
            article_list: "article",
            title: "h2.entry-title a, h3.entry-title a, h2 a, h3 a",
            date: "time[datetime]",
            content: ".entry-content",
            tags: "a[rel='tag']",
        },
        "guinee360" => Preset {
            article_list: "article, .post-item",
            title: "h2 a, h3 a, .entry-title a",
            date: "time[datetime], .post-date",
            content: ".entry-content, .post-content",
            tags: "a[rel='tag']",
        },
        "ledjely" => Preset {
            article_list: "article.hentry, article.penci-post-item",
            title: "h3 a, h2 a, .penci__post-title a",
            date: "time[datetime]",
            content: ".penci-entry-content, .entry-content, .post-content",
            tags: "a[rel='tag'], .penci-post-tags a",
        },
        "mosaiqueguinee" => Preset {
            article_list: "article.jeg_post",
            title: "h3.jeg_post_title a, h3 a, h2 a",
            date: "time[datetime], .jeg_meta_date",
            content: ".jeg_inner_content .content-inner, .entry-content, .content-inner",
            tags: "a[rel='tag'], .jeg_post_tags a",
        },
        "mediaguinee" => Preset {
            article_list: ".listing-item, article",
            title: "h2.title a, h3.title a, .title a, h2 a, h3 a",
            date: "time[datetime]",
            content: ".entry-content, .td-post-content, .post-content",
            tags: "a[rel='tag']",
        },
        "guineematin" => Preset {
            article_list: ".td-module-container, article",
            title: ".td-module-title a, h3 a, h2 a",
            date: "time[datetime], .td-post-date",
            content: ".td-post-content, .entry-content",
            tags: "a[rel='tag'], .td-tags a",
        },
        "visionguinee" | "guinee114" => Preset {
            article_list: "article, .post",
            title: "h2 a, h3 a, .entry-title a",
            date: "time[datetime]",
            content: ".entry-content, .post-content",
            tags: "a[rel='tag']",
        },
        "africaguinee" => Preset {
            article_list: "article, .post",
            title: "h2 a, h3 a, .entry-title a",
            date: "time[datetime], .post-date",
            content: ".entry-content, .post-content",
            tags: "a[rel='tag']",
        },
        _ => DEFAULT_PRESET,
    }
}

/// Containers tried when the configured list selector matches nothing.
static LIST_FALLBACKS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", ".hentry", ".td-module-container"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

/// Direct title-link scan for themes without per-article containers.
static TITLE_SCAN: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "h3.jeg_post_title a",
        "h2.entry-title a",
        "h3.entry-title a",
        ".td-module-title a",
        ".post-title a",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static ARTICLE_TITLE_FALLBACKS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "h1.entry-title",
        "h1.post-title",
        "h1.penci__post-title",
        "h1.jeg_post_title",
        "h1.td-post-title",
        "article h1",
        "h1",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static CONTENT_FALLBACKS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        ".entry-content",
        ".post-content",
        ".td-post-content",
        ".penci-entry-content",
        ".jeg_inner_content",
        ".content-inner",
        "article .content",
        "article",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

pub struct WordPressAdapter {
    source_name: String,
    base: Url,
    encoding: String,
    list_sel: Selector,
    title_sel: Selector,
    date_sel: Selector,
    content_sel: Selector,
    tags_sel: Selector,
}

impl WordPressAdapter {
    pub fn new(source: &Source) -> Result<Self> {
        let base = Url::parse(&source.base_url)
            .map_err(|e| Error::Config(format!("malformed base_url: {}", e)))?;
        let preset = preset(source.site.as_deref().unwrap_or_default());
        let sel = &source.selectors;

        Ok(WordPressAdapter {
            source_name: source.name.clone(),
            base,
            encoding: source.encoding.clone(),
            list_sel: compile_selector(
                "article_list",
                sel.article_list.as_deref().unwrap_or(preset.article_list),
            )?,
            title_sel: compile_selector("title", sel.title.as_deref().unwrap_or(preset.title))?,
            date_sel: compile_selector("date", sel.date.as_deref().unwrap_or(preset.date))?,
            content_sel: compile_selector(
                "content",
                sel.content.as_deref().unwrap_or(preset.content),
            )?,
            tags_sel: compile_selector("tags", sel.tags.as_deref().unwrap_or(preset.tags))?,
        })
    }

    pub fn parse_listing(&self, html: &str) -> Vec<ArticleStub> {
        let document = Html::parse_document(html);

        let mut blocks: Vec<_> = document.select(&self.list_sel).collect();
        if blocks.is_empty() {
            for fallback in LIST_FALLBACKS.iter() {
                blocks = document.select(fallback).collect();
                if !blocks.is_empty() {
                    debug!("[{}] using fallback list selector", self.source_name);
                    break;
                }
            }
        }

        let mut stubs = Vec::new();
        for block in &blocks {
            let Some(anchor) = block.select(&self.title_sel).next() else {
                continue;
            };
            let title = element_text(anchor);
            let Some(href) = anchor.value().attr("href") else {
                warn!("[{}] listing block without link, skipped", self.source_name);
                continue;
            };
            let link = match absolutize(&self.base, href) {
                Ok(link) => link,
                Err(e) => {
                    warn!("[{}] {}", self.source_name, e);
                    continue;
                }
            };
            if title.is_empty() {
                warn!("[{}] listing block without title, skipped", self.source_name);
                continue;
            }
            let raw_date = block.select(&self.date_sel).next().and_then(raw_date_of);
            stubs.push(ArticleStub { title, link, raw_date });
        }

        // Themes without per-article containers: scan title links directly
        // and keep whichever approach found more.
        if blocks.len() < 3 {
            let scanned = self.scan_title_links(&document);
            if scanned.len() > stubs.len() {
                debug!(
                    "[{}] title scan found {} stubs (containers: {})",
                    self.source_name,
                    scanned.len(),
                    stubs.len()
                );
                return scanned;
            }
        }

        stubs
    }

    fn scan_title_links(&self, document: &Html) -> Vec<ArticleStub> {
        let mut stubs: Vec<ArticleStub> = Vec::new();

        for selector in TITLE_SCAN.iter() {
            let anchors: Vec<_> = document.select(selector).collect();
            if anchors.is_empty() {
                continue;
            }
            for anchor in anchors {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                let Ok(link) = absolutize(&self.base, href) else {
                    continue;
                };
                if stubs.iter().any(|s| s.link == link) {
                    continue;
                }
                let title = element_text(anchor);
                if title.chars().count() > 5 {
                    // Date comes from the permalink or the article page.
                    stubs.push(ArticleStub { title, link, raw_date: None });
                }
            }
            break;
        }

        stubs
    }

    pub fn parse_article(&self, html: &str) -> Extracted {
        let document = Html::parse_document(html);

        let title = ARTICLE_TITLE_FALLBACKS
            .iter()
            .filter_map(|sel| document.select(sel).next())
            .map(element_text)
            .find(|t| t.chars().count() > 5)
            .or_else(|| meta_content(&document, "og:title"))
            .unwrap_or_default();

        let content = self
            .best_content(&document)
            .or_else(|| meta_content(&document, "og:description"))
            .unwrap_or_default();

        let published_at = document
            .select(&self.date_sel)
            .filter_map(raw_date_of)
            .find_map(|raw| parse_raw_date(&raw))
            .or_else(|| {
                meta_content(&document, "article:published_time")
                    .and_then(|raw| parse_raw_date(&raw))
            });

        let tags = document
            .select(&self.tags_sel)
            .map(element_text)
            .filter(|t| !t.is_empty() && t.chars().count() < 50)
            .fold(Vec::new(), |mut acc, t| {
                if !acc.contains(&t) {
                    acc.push(t);
                }
                acc
            });

        Extracted {
            title,
            content,
            published_at,
            category: meta_content(&document, "article:section"),
            tags,
        }
    }

    /// Configured content selector first, then theme fallbacks; among the
    /// matches, the element with the most text wins, provided it carries a
    /// real body (over 100 characters).
    fn best_content(&self, document: &Html) -> Option<String> {
        let configured = document
            .select(&self.content_sel)
            .map(content_text)
            .max_by_key(|t| t.chars().count());
        if let Some(text) = configured {
            if text.chars().count() > 100 {
                return Some(text);
            }
        }

        for fallback in CONTENT_FALLBACKS.iter() {
            let best = document
                .select(fallback)
                .map(content_text)
                .max_by_key(|t| t.chars().count());
            if let Some(text) = best {
                if text.chars().count() > 100 {
                    return Some(text);
                }
            }
        }

        None
    }
}

#[async_trait]
impl SourceAdapter for WordPressAdapter {
    async fn list_stubs(&self, fetcher: &Fetcher, category: &Category) -> Result<Vec<ArticleStub>> {
        let html = fetcher.get_text(&category.url, &self.encoding).await?;
        Ok(self.parse_listing(&html))
    }

    async fn extract(&self, fetcher: &Fetcher, link: &str) -> Result<Extracted> {
        let html = fetcher.get_text(link, &self.encoding).await?;
        let extracted = self.parse_article(&html);
        if extracted.content.is_empty() {
            return Err(Error::Parse(format!("no content found at {}", link)));
        }
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veille_core::types::{AdapterKind, SelectorSet};

    fn wp_source(site: &str) -> Source {
        Source {
            name: "Ledjely".to_string(),
            base_url: "https://ledjely.com".to_string(),
            adapter: AdapterKind::Wordpress,
            site: Some(site.to_string()),
            categories: vec![],
            selectors: SelectorSet::default(),
            encoding: "utf-8".to_string(),
            active: true,
        }
    }

    #[test]
    fn test_preset_listing() {
        let adapter = WordPressAdapter::new(&wp_source("ledjely")).unwrap();
        let html = r#"
            <article class="hentry">
              <h3><a href="/2026/03/14/ceni-calendrier/">La CENI publie son calendrier</a></h3>
              <time datetime="2026-03-14T09:00:00+00:00">14 mars 2026</time>
            </article>
            <article class="hentry">
              <h3><a href="/2026/03/14/campagne/">La campagne commence</a></h3>
            </article>
            <article class="hentry">
              <h3><a href="/2026/03/13/resultats/">Les résultats attendus</a></h3>
            </article>
        "#;
        let stubs = adapter.parse_listing(html);
        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[0].link, "https://ledjely.com/2026/03/14/ceni-calendrier/");
        assert_eq!(stubs[0].raw_date.as_deref(), Some("2026-03-14T09:00:00+00:00"));
        assert!(stubs[1].raw_date.is_none());
    }

    #[test]
    fn test_title_scan_fallback() {
        let adapter = WordPressAdapter::new(&wp_source("mosaiqueguinee")).unwrap();
        // JNews-style page with no article.jeg_post containers.
        let html = r#"
            <div class="jeg_postblock">
              <h3 class="jeg_post_title"><a href="/article-un/">Premier titre assez long</a></h3>
              <h3 class="jeg_post_title"><a href="/article-deux/">Deuxième titre assez long</a></h3>
              <h3 class="jeg_post_title"><a href="/article-un/">Premier titre assez long</a></h3>
            </div>
        "#;
        let stubs = adapter.parse_listing(html);
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].link, "https://ledjely.com/article-un/");
    }

    #[test]
    fn test_article_content_picks_largest_block() {
        let adapter = WordPressAdapter::new(&wp_source("ledjely")).unwrap();
        let body = "Le corps de l'article parle du scrutin et des candidats. ".repeat(4);
        let html = format!(
            r#"
            <h1 class="entry-title">Titre de l'article électoral</h1>
            <div class="entry-content"><p>Extrait court.</p></div>
            <div class="entry-content"><p>{}</p></div>
            <a rel="tag" href="/tag/vote">vote</a>
            "#,
            body
        );
        let extracted = adapter.parse_article(&html);
        assert_eq!(extracted.title, "Titre de l'article électoral");
        assert!(extracted.content.contains("corps de l'article"));
        assert_eq!(extracted.tags, vec!["vote".to_string()]);
    }

    #[test]
    fn test_og_description_fallback() {
        let adapter = WordPressAdapter::new(&wp_source("guinee7")).unwrap();
        let html = r#"
            <html><head>
              <meta property="og:title" content="Titre via OG"/>
              <meta property="og:description" content="Résumé de secours."/>
            </head><body><p>rien</p></body></html>
        "#;
        let extracted = adapter.parse_article(html);
        assert_eq!(extracted.title, "Titre via OG");
        assert_eq!(extracted.content, "Résumé de secours.");
    }
}
