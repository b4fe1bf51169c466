use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use veille_core::{Article, ArticleStore, Error, Result};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        published_at TEXT,
        source TEXT NOT NULL,
        category TEXT NOT NULL,
        link TEXT NOT NULL UNIQUE,
        guid TEXT NOT NULL UNIQUE,
        tags TEXT NOT NULL DEFAULT '[]',
        relevance REAL NOT NULL DEFAULT 0,
        summary TEXT NOT NULL DEFAULT '',
        scraped_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_source ON articles (source)",
    "CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles (published_at)",
    "CREATE INDEX IF NOT EXISTS idx_articles_scraped_at ON articles (scraped_at)",
];

/// SQLite-backed article store. The UNIQUE constraints on link and guid are
/// the safety net behind the pipeline's pre-insert existence check.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| Error::Persistence(format!("cannot open {}: {}", db_path.display(), e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Persistence(format!("migration {} failed: {}", i, e)))?;
        }

        Ok(SqliteStore { pool })
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM articles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn exists(&self, link: &str, guid: &str) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM articles WHERE link = ? OR guid = ?) AS present")
            .bind(link)
            .bind(guid)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        let present: i64 = row.get("present");
        Ok(present != 0)
    }

    async fn insert_if_absent(&self, article: &Article) -> Result<bool> {
        let tags = serde_json::to_string(&article.tags)?;

        let result = sqlx::query(
            r#"
            INSERT INTO articles
            (title, content, published_at, source, category, link, guid,
             tags, relevance, summary, scraped_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.published_at.map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string()))
        .bind(&article.source)
        .bind(&article.category)
        .bind(&article.link)
        .bind(&article.guid)
        .bind(tags)
        .bind(article.relevance)
        .bind(&article.summary)
        .bind(article.scraped_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            // A concurrent worker won the race; not an error.
            Err(sqlx::Error::Database(db)) if db.kind() == sqlx::error::ErrorKind::UniqueViolation => {
                Ok(false)
            }
            Err(e) => Err(Error::Persistence(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use tempfile::tempdir;

    fn article(link: &str, guid: &str) -> Article {
        Article {
            title: "La CENI publie le calendrier".to_string(),
            content: "Le scrutin est fixé.".to_string(),
            published_at: NaiveDate::from_ymd_opt(2026, 3, 14)
                .and_then(|d| d.and_hms_opt(10, 30, 0)),
            source: "Guineenews".to_string(),
            category: "Politique".to_string(),
            link: link.to_string(),
            guid: guid.to_string(),
            tags: vec!["CENI".to_string()],
            relevance: 3.0,
            summary: "Le scrutin est fixé.".to_string(),
            scraped_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_exists() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).await.unwrap();

        let a = article("https://guineenews.org/a", "guid-a");
        assert!(!store.exists(&a.link, &a.guid).await.unwrap());
        assert!(store.insert_if_absent(&a).await.unwrap());
        assert!(store.exists(&a.link, &a.guid).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_guid_is_not_an_error() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).await.unwrap();

        let first = article("https://guineenews.org/a", "guid-a");
        let same_guid = article("https://guineenews.org/b", "guid-a");
        assert!(store.insert_if_absent(&first).await.unwrap());
        assert!(!store.insert_if_absent(&same_guid).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_link_is_not_an_error() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).await.unwrap();

        assert!(store
            .insert_if_absent(&article("https://guineenews.org/a", "guid-a"))
            .await
            .unwrap());
        assert!(!store
            .insert_if_absent(&article("https://guineenews.org/a", "guid-b"))
            .await
            .unwrap());
    }
}
