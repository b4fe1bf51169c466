use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use veille_core::config::{load_keywords, load_sources};
use veille_core::score::KeywordSet;
use veille_core::storage::ArticleStore;
use veille_core::window::DateWindow;
use veille_scrapers::{Pipeline, RunOptions};
use veille_storage::{MemoryStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Collecte quotidienne d'articles électoraux dans la presse guinéenne", long_about = None)]
struct Cli {
    /// Directory holding sources.yaml and keywords.yaml.
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,
    #[arg(long, default_value = "sqlite", help = "Storage backend: sqlite or memory")]
    storage: String,
    #[arg(long, default_value = "data/veille.db")]
    db: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Collect articles published inside the target window.
    Run {
        /// Restrict the run to these source names (repeatable).
        #[arg(long)]
        source: Vec<String>,
        /// First day of the window (YYYY-MM-DD). Defaults to yesterday.
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day of the window (YYYY-MM-DD). Defaults to --start.
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Print the run report as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
    /// List the configured sources.
    ListSources,
}

async fn create_storage(kind: &str, db: &PathBuf) -> anyhow::Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "sqlite" => {
            let store = SqliteStore::open(db)
                .await
                .with_context(|| format!("opening database {}", db.display()))?;
            Ok(Arc::new(store))
        }
        other => bail!("unknown storage backend '{}' (expected sqlite or memory)", other),
    }
}

/// Resolves the collection window from the flags, defaulting to the day
/// before today.
fn resolve_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> anyhow::Result<DateWindow> {
    match (start, end) {
        (None, None) => Ok(DateWindow::preceding_day(Utc::now().date_naive())),
        (Some(start), end) => Ok(DateWindow::new(start, end.unwrap_or(start))?),
        (None, Some(_)) => bail!("--end requires --start"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let sources_path = cli.config_dir.join("sources.yaml");
    let (sources, settings) = load_sources(&sources_path)
        .with_context(|| format!("loading {}", sources_path.display()))?;
    info!("📋 Loaded {} sources from {}", sources.len(), sources_path.display());

    match cli.command {
        Commands::ListSources => {
            for source in &sources {
                println!(
                    "{}{}\t{}\t{} categories",
                    source.name,
                    if source.active { "" } else { " (inactive)" },
                    source.base_url,
                    source.categories.len()
                );
            }
        }
        Commands::Run { source, start, end, json } => {
            let window = resolve_window(start, end)?;

            let keywords_path = cli.config_dir.join("keywords.yaml");
            let keywords = if keywords_path.exists() {
                load_keywords(&keywords_path)
                    .with_context(|| format!("loading {}", keywords_path.display()))?
            } else {
                info!("No keywords.yaml, using the built-in election keyword set");
                KeywordSet::default_election()
            };
            let keywords = if keywords.is_empty() {
                warn!("Keyword set has no terms, falling back to the built-in election set");
                KeywordSet::default_election()
            } else {
                keywords
            };

            let store = create_storage(&cli.storage, &cli.db).await?;
            info!("💾 Storage initialized (using {})", cli.storage);

            let pipeline = Pipeline::new(sources, keywords, settings, store)?;
            let cancel = pipeline.cancel_flag();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("🛑 Interrupt received, finishing current category...");
                    cancel.store(true, Ordering::Relaxed);
                }
            });

            let selection = if source.is_empty() { None } else { Some(source) };
            let report = pipeline
                .run(&RunOptions { window, sources: selection })
                .await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            if report.all_sources_failed() {
                error!("❌ Every source failed, check connectivity and selectors");
            }
            if report.failed_sources() > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
