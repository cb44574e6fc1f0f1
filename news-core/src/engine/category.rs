use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::{state_channel, FeedState, LoadOutcome};
use crate::cache::ResponseCache;
use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::models::CategoryFilter;
use crate::prefetch::PrefetchScheduler;
use crate::request::RequestController;
use crate::source::{ArticleSource, FeedQuery, PageRequest};

/// Headlines for one category, paged through the shared [`ResponseCache`].
///
/// Cloning yields another handle to the same feed instance.
#[derive(Clone)]
pub struct CategoryFeed {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn ArticleSource>,
    cache: ResponseCache,
    controller: RequestController,
    prefetch: Option<PrefetchScheduler>,
    page_size: usize,
    max_pages: u32,
    filter: watch::Sender<CategoryFilter>,
    state: watch::Sender<FeedState>,
    closed: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.controller.cancel();
    }
}

impl CategoryFeed {
    pub fn new(
        filter: CategoryFilter,
        source: Arc<dyn ArticleSource>,
        cache: ResponseCache,
        config: &FeedConfig,
    ) -> Self {
        let prefetch = config.prefetch_enabled.then(|| {
            PrefetchScheduler::new(cache.clone(), Arc::clone(&source), config.prefetch_delay())
        });
        let (filter_tx, _) = watch::channel(filter);
        Self {
            inner: Arc::new(Inner {
                source,
                cache,
                controller: RequestController::new(),
                prefetch,
                page_size: config.page_size,
                max_pages: config.max_pages,
                filter: filter_tx,
                state: state_channel(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> FeedState {
        self.inner.state.borrow().clone()
    }

    pub fn category(&self) -> CategoryFilter {
        *self.inner.filter.borrow()
    }

    pub fn pending_prefetches(&self) -> usize {
        self.inner.prefetch.as_ref().map_or(0, |p| p.pending())
    }

    /// First load after mount: reset, then page 1.
    pub async fn start(&self) -> Result<LoadOutcome, FeedError> {
        self.inner.controller.cancel();
        self.inner.state.send_modify(|s| {
            s.reset();
            s.settle();
        });
        self.load(1, false).await
    }

    /// Switches category. State is cleared before the first page is requested.
    pub async fn set_category(&self, filter: CategoryFilter) -> Result<LoadOutcome, FeedError> {
        if self.category() == filter {
            return Ok(LoadOutcome::Skipped);
        }
        debug!(from = %self.category(), to = %filter, "category changed");
        self.inner.filter.send_replace(filter);
        self.start().await
    }

    pub async fn load(&self, page: u32, force_refresh: bool) -> Result<LoadOutcome, FeedError> {
        if page == 0 {
            return Err(FeedError::InvalidPage(page));
        }
        if self.is_closed() {
            return Ok(LoadOutcome::Superseded);
        }

        let inner = &self.inner;
        let request = inner.controller.start_request();
        let filter = self.category();
        let key = filter.page_key(page);

        if !force_refresh {
            if let Some(cached) = inner.cache.get(&key).await {
                if !inner.controller.is_current(&request) {
                    return Ok(LoadOutcome::Superseded);
                }
                inner
                    .state
                    .send_modify(|s| s.commit(page, cached.articles, page == 1, inner.max_pages));
                inner.controller.finish(&request);
                self.schedule_prefetch().await;
                return Ok(LoadOutcome::Cached);
            }
        }

        inner.state.send_modify(|s| s.begin(page));

        let page_request = PageRequest {
            query: FeedQuery::Category(filter),
            page,
            page_size: inner.page_size,
            force_refresh,
        };
        let result = inner.source.fetch_page(&page_request, request.token()).await;

        if !inner.controller.is_current(&request) {
            debug!(key, request = request.id(), "discarding superseded page");
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(articles) => {
                let replace = page == 1 || force_refresh;
                inner
                    .state
                    .send_modify(|s| s.commit(page, articles.clone(), replace, inner.max_pages));
                inner.controller.finish(&request);
                inner.cache.set(key, articles).await;
                self.schedule_prefetch().await;
                Ok(LoadOutcome::Fetched)
            }
            Err(FeedError::Cancelled) => {
                // Still current, so the source gave up on its own: no error to show.
                inner.state.send_modify(FeedState::settle);
                inner.controller.finish(&request);
                Ok(LoadOutcome::Superseded)
            }
            Err(e) => {
                warn!(category = %filter, page, error = %e, "failed to load page");
                inner.state.send_modify(FeedState::fail);
                inner.controller.finish(&request);
                Err(e)
            }
        }
    }

    pub async fn load_more(&self) -> Result<LoadOutcome, FeedError> {
        let next = {
            let state = self.inner.state.borrow();
            if state.is_busy() || !state.has_more {
                return Ok(LoadOutcome::Skipped);
            }
            state.page + 1
        };
        self.load(next, false).await
    }

    /// Drops this category's cached pages and reloads page 1 from the source.
    pub async fn refresh(&self) -> Result<LoadOutcome, FeedError> {
        self.inner.state.send_modify(|s| {
            s.refreshing = true;
            s.page = 1;
            s.has_more = true;
        });
        let prefix = self.category().key_prefix();
        self.inner.cache.invalidate_prefix(&prefix).await;
        self.load(1, true).await
    }

    pub fn reset(&self) {
        self.inner.state.send_modify(FeedState::reset);
    }

    /// Cancels in-flight and pending work; later loads are no-ops.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.controller.cancel();
        if let Some(prefetch) = &self.inner.prefetch {
            prefetch.shutdown();
        }
        self.inner.state.send_modify(FeedState::settle);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    async fn schedule_prefetch(&self) {
        let Some(prefetch) = &self.inner.prefetch else {
            return;
        };
        let next = {
            let state = self.inner.state.borrow();
            if state.is_busy() || !state.has_more || state.page >= self.inner.max_pages {
                return;
            }
            state.page + 1
        };
        let filter = self.category();
        let request = PageRequest {
            query: FeedQuery::Category(filter),
            page: next,
            page_size: self.inner.page_size,
            force_refresh: false,
        };
        if prefetch.schedule(filter.page_key(next), request).await {
            debug!(category = %filter, page = next, "prefetch scheduled");
        }
    }
}
