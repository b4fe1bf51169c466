use async_trait::async_trait;

use crate::types::Article;
use crate::Result;

/// Persistence boundary for the pipeline: one existence check and one
/// insert-if-absent write. The pipeline never updates or deletes records.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// True when a record matching the link or the derived identifier
    /// already exists.
    async fn exists(&self, link: &str, guid: &str) -> Result<bool>;

    /// Inserts the article unless a record with the same link or guid is
    /// already present. Returns true when a row was written, false when the
    /// article turned out to be a duplicate (including the race where a
    /// concurrent worker inserted it between check and write).
    async fn insert_if_absent(&self, article: &Article) -> Result<bool>;
}
