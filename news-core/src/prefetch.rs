//! Best-effort background fetch of the next page into the response cache.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::cache::ResponseCache;
use crate::error::FeedError;
use crate::request::CancellationToken;
use crate::source::{ArticleSource, PageRequest};

pub struct PrefetchScheduler {
    cache: ResponseCache,
    source: Arc<dyn ArticleSource>,
    delay: Duration,
    /// Keys scheduled or running; a key is never prefetched twice at once.
    in_flight: Arc<Mutex<HashSet<String>>>,
    shutdown: CancellationToken,
}

impl PrefetchScheduler {
    pub fn new(cache: ResponseCache, source: Arc<dyn ArticleSource>, delay: Duration) -> Self {
        Self {
            cache,
            source,
            delay,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Schedules `request` to be stored under `key` after the delay.
    ///
    /// Returns `false` when the key is already cached, already pending, or the
    /// scheduler has been shut down.
    pub async fn schedule(&self, key: String, request: PageRequest) -> bool {
        if self.shutdown.is_cancelled() || self.cache.has(&key).await {
            return false;
        }
        if !lock(&self.in_flight).insert(key.clone()) {
            debug!(key, "prefetch already pending");
            return false;
        }

        let cache = self.cache.clone();
        let source = Arc::clone(&self.source);
        let in_flight = Arc::clone(&self.in_flight);
        let shutdown = self.shutdown.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    prefetch_into(&cache, source.as_ref(), &key, &request, &shutdown).await;
                }
            }
            lock(&in_flight).remove(&key);
        });
        true
    }

    pub fn pending(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Drops every pending prefetch. Further `schedule` calls are ignored.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for PrefetchScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn prefetch_into(
    cache: &ResponseCache,
    source: &dyn ArticleSource,
    key: &str,
    request: &PageRequest,
    shutdown: &CancellationToken,
) {
    if cache.has(key).await {
        return;
    }
    match source.fetch_page(request, shutdown).await {
        // A foreground load may have landed while we were fetching.
        Ok(articles) if !cache.has(key).await => {
            debug!(key, count = articles.len(), "prefetched page");
            cache.set(key, articles).await;
        }
        Ok(_) => {}
        Err(FeedError::Cancelled) => {}
        Err(e) => debug!(key, error = %e, "prefetch failed"),
    }
}

fn lock(set: &Mutex<HashSet<String>>) -> std::sync::MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
