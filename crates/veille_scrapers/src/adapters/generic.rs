//! Selector-driven adapter: all structure comes from configuration.

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

/// Title candidates tried on article pages, most specific first.
static TITLE_FALLBACKS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "h1.entry-title",
        "h1.post-title",
        "h1.article-title",
        "article h1",
        "h1",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

#[derive(Debug)]
pub struct GenericAdapter {
    source_name: String,
    base: Url,
    encoding: String,
    list_sel: Selector,
    title_sel: Selector,
    link_sel: Selector,
    date_sel: Selector,
    content_sel: Selector,
    tags_sel: Selector,
}

impl GenericAdapter {
    pub fn new(source: &Source) -> Result<Self> {
        let base = Url::parse(&source.base_url)
            .map_err(|e| Error::Config(format!("malformed base_url: {}", e)))?;
        let sel = &source.selectors;

        Ok(GenericAdapter {
            source_name: source.name.clone(),
            base,
            encoding: source.encoding.clone(),
            list_sel: compile_selector(
                "article_list",
                sel.article_list.as_deref().unwrap_or("article"),
            )?,
            title_sel: compile_selector("title", sel.title.as_deref().unwrap_or("h2 a, h3 a"))?,
            link_sel: compile_selector("link", sel.link.as_deref().unwrap_or("h2 a, h3 a"))?,
            date_sel: compile_selector("date", sel.date.as_deref().unwrap_or("time"))?,
            content_sel: compile_selector(
                "content",
                sel.content.as_deref().unwrap_or("div.entry-content, div.content"),
            )?,
            tags_sel: compile_selector("tags", sel.tags.as_deref().unwrap_or("a[rel='tag']"))?,
        })
    }

    /// Pulls stubs out of a listing page. A block missing title or link is
    /// skipped with a warning, never fatal to the category.
    pub fn parse_listing(&self, html: &str) -> Vec<ArticleStub> {
        let document = Html::parse_document(html);
        let mut stubs = Vec::new();

        for block in document.select(&self.list_sel) {
            let title = block.select(&self.title_sel).next().map(element_text);
            let href = block
                .select(&self.link_sel)
                .next()
                .and_then(|el| el.value().attr("href"))
                .map(str::to_string);

            let (title, href) = match (title, href) {
                (Some(t), Some(h)) if !t.is_empty() && !h.is_empty() => (t, h),
                _ => {
                    warn!("[{}] listing block without title or link, skipped", self.source_name);
                    continue;
                }
            };

            let link = match absolutize(&self.base, &href) {
                Ok(link) => link,
                Err(e) => {
                    warn!("[{}] {}", self.source_name, e);
                    continue;
                }
            };

            let raw_date = block.select(&self.date_sel).next().and_then(raw_date_of);
            stubs.push(ArticleStub { title, link, raw_date });
        }

        debug!("[{}] {} stubs extracted from listing", self.source_name, stubs.len());
        stubs
    }

    pub fn parse_article(&self, html: &str) -> Extracted {
        let document = Html::parse_document(html);

        let title = TITLE_FALLBACKS
            .iter()
            .filter_map(|sel| document.select(sel).next())
            .map(element_text)
            .find(|t| t.chars().count() > 5)
            .or_else(|| meta_content(&document, "og:title"))
            .unwrap_or_default();

        let content = document
            .select(&self.content_sel)
            .map(content_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let published_at = document
            .select(&self.date_sel)
            .next()
            .and_then(raw_date_of)
            .and_then(|raw| parse_raw_date(&raw))
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
}

#[async_trait]
impl SourceAdapter for GenericAdapter {
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
