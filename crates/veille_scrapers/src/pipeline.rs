//! Run orchestration: walks every selected source's category listings,
//! filters stubs against the date window, extracts and scores the surviving
//! articles and persists them behind the dedup guard. One bad category or
//! article never takes down the run.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info, warn};

use veille_core::config::Settings;
use veille_core::score::{matched_terms, relevance, KeywordSet};
use veille_core::storage::ArticleStore;
use veille_core::text::{guid_from_link, normalize_link, summarize};
use veille_core::types::{Article, ArticleStub, RunReport, Source, SourceReport};
use veille_core::window::DateWindow;
use veille_core::Result;

use crate::adapters::{adapter_for, SourceAdapter};
use crate::dates::{date_from_url, parse_raw_date};
use crate::fetch::Fetcher;

/// Builds the adapter for one source. Swappable for tests.
pub type AdapterFactory =
    Box<dyn Fn(&Source) -> Result<Box<dyn SourceAdapter>> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub window: DateWindow,
    /// Restrict the run to these source names (case-insensitive). None runs
    /// every active source.
    pub sources: Option<Vec<String>>,
}

enum Outcome {
    Persisted,
    Duplicate,
    FilteredOut,
    Failed,
}

pub struct Pipeline {
    sources: Vec<Source>,
    keywords: KeywordSet,
    settings: Settings,
    store: Arc<dyn ArticleStore>,
    fetcher: Fetcher,
    adapter_factory: AdapterFactory,
    cancel: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(
        sources: Vec<Source>,
        keywords: KeywordSet,
        settings: Settings,
        store: Arc<dyn ArticleStore>,
    ) -> Result<Self> {
        let fetcher = Fetcher::new(&settings)?;
        Ok(Pipeline {
            sources,
            keywords,
            settings,
            store,
            fetcher,
            adapter_factory: Box::new(adapter_for),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replaces the adapter factory, mainly to inject fixture adapters in
    /// tests.
    pub fn with_adapter_factory(mut self, factory: AdapterFactory) -> Self {
        self.adapter_factory = factory;
        self
    }

    /// Shared flag that aborts the run between categories when set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub async fn run(&self, options: &RunOptions) -> RunReport {
        let started_at = Utc::now();
        info!(
            "🚀 Starting collection run ({} → {})",
            options.window.start, options.window.end
        );

        let selected: Vec<&Source> = self
            .sources
            .iter()
            .filter(|s| s.active)
            .filter(|s| match &options.sources {
                Some(names) => names.iter().any(|n| n.eq_ignore_ascii_case(&s.name)),
                None => true,
            })
            .collect();

        if selected.is_empty() {
            warn!("No source matches the selection, nothing to do");
        }

        // Guid seen-set shared by every source in this run, so the same
        // article syndicated across categories is only persisted once.
        let seen = Mutex::new(HashSet::new());
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_fetches));

        let mut reports = Vec::with_capacity(selected.len());
        for source in selected {
            if self.cancel.load(Ordering::Relaxed) {
                info!("🛑 Run cancelled, skipping remaining sources");
                break;
            }
            let report = self
                .process_source(source, &options.window, &seen, &semaphore)
                .await;
            info!(
                "📊 [{}] fetched={} persisted={} duplicates={} filtered={} errors={}",
                report.source,
                report.fetched,
                report.persisted,
                report.duplicates,
                report.filtered_out,
                report.errors
            );
            reports.push(report);
        }

        let run = RunReport {
            started_at,
            finished_at: Utc::now(),
            sources: reports,
        };
        info!(
            "✅ Run finished: {} persisted, {} duplicates, {} sources failed",
            run.total_persisted(),
            run.total_duplicates(),
            run.failed_sources()
        );
        run
    }

    async fn process_source(
        &self,
        source: &Source,
        window: &DateWindow,
        seen: &Mutex<HashSet<String>>,
        semaphore: &Arc<Semaphore>,
    ) -> SourceReport {
        let mut report = SourceReport::new(&source.name);
        info!("🕷️ [{}] scraping {} categories", source.name, source.categories.len());

        let adapter = match (self.adapter_factory)(source) {
            Ok(adapter) => adapter,
            Err(e) => {
                error!("❌ [{}] adapter setup failed: {}", source.name, e);
                report.fatal = Some(e.to_string());
                return report;
            }
        };

        let mut failed_categories = 0usize;
        for category in &source.categories {
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }
            let stubs = match adapter.list_stubs(&self.fetcher, category).await {
                Ok(mut stubs) => {
                    stubs.truncate(self.settings.max_articles_per_category);
                    stubs
                }
                Err(e) => {
                    warn!("⚠️ [{}] category '{}' failed: {}", source.name, category.label, e);
                    failed_categories += 1;
                    report.errors += 1;
                    continue;
                }
            };
            report.fetched += stubs.len();
            debug!(
                "[{}] category '{}': {} stubs",
                source.name, category.label, stubs.len()
            );

            // Window filter on listing dates before any article fetch.
            let mut candidates = Vec::new();
            for stub in stubs {
                let listed_at = stub
                    .raw_date
                    .as_deref()
                    .and_then(parse_raw_date)
                    .or_else(|| date_from_url(&stub.link));
                match listed_at {
                    None => {
                        warn!("⚠️ [{}] undated stub dropped: {}", source.name, stub.link);
                        report.filtered_out += 1;
                    }
                    Some(dt) if !window.contains(dt.date()) => {
                        report.filtered_out += 1;
                    }
                    Some(dt) => candidates.push((stub, dt)),
                }
            }

            let tasks = candidates.into_iter().map(|(stub, listed_at)| {
                let semaphore = Arc::clone(semaphore);
                let adapter = &adapter;
                async move {
                    // Semaphore is never closed while the run is alive.
                    let _permit = semaphore.acquire().await.ok()?;
                    Some(
                        self.process_article(
                            adapter.as_ref(),
                            source,
                            &category.label,
                            stub,
                            listed_at,
                            window,
                            seen,
                        )
                        .await,
                    )
                }
            });
            for outcome in join_all(tasks).await.into_iter().flatten() {
                match outcome {
                    Outcome::Persisted => report.persisted += 1,
                    Outcome::Duplicate => report.duplicates += 1,
                    Outcome::FilteredOut => report.filtered_out += 1,
                    Outcome::Failed => report.errors += 1,
                }
            }
        }

        if !source.categories.is_empty() && failed_categories == source.categories.len() {
            report.fatal = Some("all category listings failed".to_string());
            error!("❌ [{}] every category listing failed", source.name);
        }
        report
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_article(
        &self,
        adapter: &dyn SourceAdapter,
        source: &Source,
        category: &str,
        stub: ArticleStub,
        listed_at: chrono::NaiveDateTime,
        window: &DateWindow,
        seen: &Mutex<HashSet<String>>,
    ) -> Outcome {
        let link = normalize_link(&stub.link);
        let guid = guid_from_link(&link);

        if !seen.lock().await.insert(guid.clone()) {
            debug!("[{}] already handled this run: {}", source.name, link);
            return Outcome::Duplicate;
        }
        match self.store.exists(&link, &guid).await {
            Ok(true) => {
                debug!("[{}] already stored: {}", source.name, link);
                return Outcome::Duplicate;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("⚠️ [{}] dedup lookup failed for {}: {}", source.name, link, e);
                return Outcome::Failed;
            }
        }

        let extracted = match adapter.extract(&self.fetcher, &link).await {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("⚠️ [{}] extraction failed for {}: {}", source.name, link, e);
                return Outcome::Failed;
            }
        };

        // The article page's own date overrules the listing date; a page
        // dated outside the window slipped through the listing filter.
        let published_at = extracted.published_at.unwrap_or(listed_at);
        if !window.contains(published_at.date()) {
            debug!("[{}] page date outside window: {}", source.name, link);
            return Outcome::FilteredOut;
        }

        let title = if extracted.title.is_empty() {
            stub.title
        } else {
            extracted.title
        };
        // The page's own rubric wins over the configured category label.
        let category = extracted
            .category
            .clone()
            .unwrap_or_else(|| category.to_string());
        let score = relevance(&title, &extracted.content, &self.keywords);
        let summary = summarize(&extracted.content, self.settings.summary_max_len);

        let article = Article {
            title,
            content: extracted.content,
            published_at: Some(published_at),
            source: source.name.clone(),
            category,
            link: link.clone(),
            guid,
            tags: extracted.tags,
            relevance: score,
            summary,
            scraped_at: Utc::now(),
        };

        match self.store.insert_if_absent(&article).await {
            Ok(true) => {
                if score >= 3.0 {
                    let terms = matched_terms(&article.title, &article.content, &self.keywords);
                    info!(
                        "🗳️ [{}] high relevance ({:.0}, termes: {}): {}",
                        source.name,
                        score,
                        terms.join(", "),
                        article.title
                    );
                } else {
                    info!("📰 [{}] saved: {}", source.name, article.title);
                }
                Outcome::Persisted
            }
            Ok(false) => Outcome::Duplicate,
            Err(e) => {
                warn!("⚠️ [{}] persist failed for {}: {}", source.name, link, e);
                Outcome::Failed
            }
        }
    }
}
