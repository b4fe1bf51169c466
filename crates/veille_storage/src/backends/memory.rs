use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use veille_core::{Article, ArticleStore, Result};

/// In-memory store, used by tests and dry runs. Enforces the same link/guid
/// uniqueness as the SQLite backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    by_guid: HashMap<String, Article>,
    links: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_guid.len()
    }

    pub async fn get(&self, guid: &str) -> Option<Article> {
        self.inner.read().await.by_guid.get(guid).cloned()
    }

    pub async fn all(&self) -> Vec<Article> {
        self.inner.read().await.by_guid.values().cloned().collect()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn exists(&self, link: &str, guid: &str) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.by_guid.contains_key(guid) || inner.links.contains(link))
    }

    async fn insert_if_absent(&self, article: &Article) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.by_guid.contains_key(&article.guid) || inner.links.contains(&article.link) {
            return Ok(false);
        }
        inner.links.insert(article.link.clone());
        inner.by_guid.insert(article.guid.clone(), article.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(link: &str, guid: &str) -> Article {
        Article {
            title: "Titre".to_string(),
            content: "Contenu".to_string(),
            published_at: None,
            source: "Test".to_string(),
            category: "Politique".to_string(),
            link: link.to_string(),
            guid: guid.to_string(),
            tags: vec![],
            relevance: 0.0,
            summary: "Contenu".to_string(),
            scraped_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_duplicate() {
        let store = MemoryStore::new();
        let a = article("https://example.com/a", "guid-a");

        assert!(store.insert_if_absent(&a).await.unwrap());
        assert!(!store.insert_if_absent(&a).await.unwrap());
        assert_eq!(store.len().await, 1);
        assert!(store.exists(&a.link, &a.guid).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_link_different_guid_rejected() {
        let store = MemoryStore::new();
        store
            .insert_if_absent(&article("https://example.com/a", "guid-a"))
            .await
            .unwrap();
        assert!(!store
            .insert_if_absent(&article("https://example.com/a", "guid-b"))
            .await
            .unwrap());
    }
}
