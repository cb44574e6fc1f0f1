use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::{state_channel, FeedState, LoadOutcome};
use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::models::Category;
use crate::request::RequestController;
use crate::source::{ArticleSource, FeedQuery, PageRequest};

/// "For you" feed mixing the reader's interest categories.
///
/// Pages are shuffled on every fetch, so this feed does not go through the
/// response cache.
#[derive(Clone)]
pub struct PersonalizedFeed {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn ArticleSource>,
    controller: RequestController,
    page_size: usize,
    max_pages: u32,
    interests: watch::Sender<Vec<Category>>,
    state: watch::Sender<FeedState>,
    closed: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.controller.cancel();
    }
}

impl PersonalizedFeed {
    pub fn new(
        interests: Vec<Category>,
        source: Arc<dyn ArticleSource>,
        config: &FeedConfig,
    ) -> Self {
        let (interests_tx, _) = watch::channel(interests);
        Self {
            inner: Arc::new(Inner {
                source,
                controller: RequestController::new(),
                page_size: config.page_size,
                max_pages: config.max_pages,
                interests: interests_tx,
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

    pub fn interests(&self) -> Vec<Category> {
        self.inner.interests.borrow().clone()
    }

    /// Loads page 1 unless the interest set is empty.
    pub async fn start(&self) -> Result<LoadOutcome, FeedError> {
        self.inner.controller.cancel();
        self.inner.state.send_modify(|s| {
            s.reset();
            s.settle();
        });
        if self.inner.interests.borrow().is_empty() {
            return Ok(LoadOutcome::Skipped);
        }
        self.load(1).await
    }

    /// Replaces the interest set and re-runs from page 1 when it changed.
    pub async fn set_interests(&self, interests: Vec<Category>) -> Result<LoadOutcome, FeedError> {
        if *self.inner.interests.borrow() == interests {
            return Ok(LoadOutcome::Skipped);
        }
        debug!(count = interests.len(), "interest set changed");
        self.inner.interests.send_replace(interests);
        self.start().await
    }

    pub async fn load(&self, page: u32) -> Result<LoadOutcome, FeedError> {
        if page == 0 {
            return Err(FeedError::InvalidPage(page));
        }
        if self.is_closed() {
            return Ok(LoadOutcome::Superseded);
        }

        let inner = &self.inner;
        let request = inner.controller.start_request();
        let page_request = PageRequest {
            query: FeedQuery::Interests(self.interests()),
            page,
            page_size: inner.page_size,
            force_refresh: false,
        };

        inner.state.send_modify(|s| s.begin(page));
        let result = inner.source.fetch_page(&page_request, request.token()).await;

        if !inner.controller.is_current(&request) {
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(articles) => {
                inner
                    .state
                    .send_modify(|s| s.commit(page, articles, page == 1, inner.max_pages));
                inner.controller.finish(&request);
                Ok(LoadOutcome::Fetched)
            }
            Err(FeedError::Cancelled) => {
                // Still current, so the source gave up on its own: no error to show.
                inner.state.send_modify(FeedState::settle);
                inner.controller.finish(&request);
                Ok(LoadOutcome::Superseded)
            }
            Err(e) => {
                warn!(page, error = %e, "failed to load personalized page");
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
        self.load(next).await
    }

    pub async fn refresh(&self) -> Result<LoadOutcome, FeedError> {
        self.inner.state.send_modify(|s| {
            s.refreshing = true;
            s.page = 1;
            s.has_more = true;
        });
        self.load(1).await
    }

    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.controller.cancel();
        self.inner.state.send_modify(FeedState::settle);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}
