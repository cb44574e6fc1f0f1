use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::models::Article;
use crate::persist::{read_json, write_json};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub url: String,
    pub source: String,
    pub added_at: DateTime<Utc>,
}

impl FavoriteItem {
    pub fn from_article(article: &Article, added_at: DateTime<Utc>) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
            image_url: article.image_url.clone(),
            url: article.url.clone(),
            source: article.source.name.clone(),
            added_at,
        }
    }
}

/// Saved articles, newest first, bounded in count and age.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    inner: Arc<RwLock<Vec<FavoriteItem>>>,
    path: Option<PathBuf>,
    max_items: usize,
}

impl FavoritesStore {
    pub fn in_memory(config: &StorageConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
            path: None,
            max_items: config.max_favorites,
        }
    }

    /// Loads the saved list, dropping entries older than the configured age.
    pub async fn load_from(path: impl AsRef<Path>, config: &StorageConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        let saved: Vec<FavoriteItem> = read_json(&path).await.unwrap_or_default();
        let cutoff = Utc::now() - Duration::days(config.favorite_max_age_days);
        let before = saved.len();
        let mut items: Vec<FavoriteItem> =
            saved.into_iter().filter(|f| f.added_at > cutoff).collect();
        items.truncate(config.max_favorites);
        if items.len() != before {
            debug!(dropped = before - items.len(), "pruned expired favorites");
        }
        Self {
            inner: Arc::new(RwLock::new(items)),
            path: Some(path),
            max_items: config.max_favorites,
        }
    }

    pub async fn list(&self) -> Vec<FavoriteItem> {
        self.inner.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_favorite(&self, id: &str) -> bool {
        self.inner.read().await.iter().any(|f| f.id == id)
    }

    /// Returns `false` when the article was already saved.
    pub async fn add(&self, article: &Article) -> bool {
        let mut items = self.inner.write().await;
        if items.iter().any(|f| f.id == article.id) {
            return false;
        }
        items.insert(0, FavoriteItem::from_article(article, Utc::now()));
        items.truncate(self.max_items);
        drop(items);
        self.persist().await;
        true
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut items = self.inner.write().await;
        let before = items.len();
        items.retain(|f| f.id != id);
        let removed = items.len() != before;
        drop(items);
        if removed {
            self.persist().await;
        }
        removed
    }

    /// Adds or removes; returns whether the article is now a favorite.
    pub async fn toggle(&self, article: &Article) -> bool {
        if self.is_favorite(&article.id).await {
            self.remove(&article.id).await;
            false
        } else {
            self.add(article).await;
            true
        }
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
        self.persist().await;
    }

    async fn persist(&self) {
        let Some(path) = &self.path else {
            debug!("favorites store is in-memory only; skipping persist");
            return;
        };
        let items = self.inner.read().await;
        if let Err(e) = write_json(path, &*items).await {
            warn!(error = %e, path = %path.display(), "failed to persist favorites");
        }
    }
}
