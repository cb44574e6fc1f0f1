use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::models::Article;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct CachePage {
    pub key: String,
    pub articles: Vec<Article>,
    pub stored_at: Instant,
}

impl CachePage {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Process-wide page cache keyed by `"{category}-{page}"`.
///
/// Stale entries are ignored by [`ResponseCache::get`] but stay in the map until
/// [`ResponseCache::invalidate_prefix`] removes them. Cloning shares the same map.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<RwLock<HashMap<String, CachePage>>>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<CachePage> {
        let inner = self.inner.read().await;
        match inner.get(key) {
            Some(page) if page.is_fresh(self.ttl) => {
                debug!(key, "response cache hit");
                Some(page.clone())
            }
            Some(_) => {
                debug!(key, "response cache entry expired");
                None
            }
            None => {
                debug!(key, "response cache miss");
                None
            }
        }
    }

    pub async fn set(&self, key: impl Into<String>, articles: Vec<Article>) {
        let key = key.into();
        let page = CachePage {
            key: key.clone(),
            articles,
            stored_at: Instant::now(),
        };
        self.inner.write().await.insert(key, page);
    }

    /// Physical presence, fresh or not.
    pub async fn has(&self, key: &str) -> bool {
        self.inner.read().await.contains_key(key)
    }

    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|key, _| !key.starts_with(prefix));
        let removed = before - inner.len();
        debug!(prefix, removed, "invalidated cached pages");
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
