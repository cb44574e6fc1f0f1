use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::http::{Request, Response};

/// One named cache bucket: request identity to stored response.
#[derive(Debug, Clone, Default)]
pub struct CacheBucket {
    entries: BTreeMap<String, Response>,
}

impl CacheBucket {
    pub fn get(&self, request: &Request) -> Option<&Response> {
        self.entries.get(&request.cache_key())
    }

    pub fn put(&mut self, request: &Request, response: Response) {
        self.entries.insert(request.cache_key(), response);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All buckets of an origin. Cloning shares the storage.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    buckets: Arc<RwLock<BTreeMap<String, CacheBucket>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the bucket if missing.
    pub async fn open(&self, name: &str) {
        self.buckets
            .write()
            .await
            .entry(name.to_string())
            .or_default();
    }

    pub async fn put(&self, bucket: &str, request: &Request, response: Response) {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .put(request, response);
    }

    pub async fn match_in(&self, bucket: &str, request: &Request) -> Option<Response> {
        let buckets = self.buckets.read().await;
        buckets.get(bucket).and_then(|b| b.get(request)).cloned()
    }

    /// First match across every bucket.
    pub async fn match_any(&self, request: &Request) -> Option<Response> {
        let buckets = self.buckets.read().await;
        buckets.values().find_map(|b| b.get(request)).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.buckets.read().await.keys().cloned().collect()
    }

    pub async fn has(&self, name: &str) -> bool {
        self.buckets.read().await.contains_key(name)
    }

    pub async fn delete(&self, name: &str) -> bool {
        self.buckets.write().await.remove(name).is_some()
    }

    pub async fn entry_count(&self, name: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(name)
            .map_or(0, CacheBucket::len)
    }
}
