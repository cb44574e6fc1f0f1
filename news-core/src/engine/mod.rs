//! Paginated feed engines.
//!
//! Both engines publish their [`FeedState`] through a `watch` channel: every
//! mutation is synchronous and happens between suspension points, and
//! consumers see the latest state with [`tokio::sync::watch::Receiver::borrow`].

mod category;
mod personalized;

pub use category::CategoryFeed;
pub use personalized::PersonalizedFeed;

use tokio::sync::watch;

use crate::error::FEED_ERROR_MESSAGE;
use crate::models::Article;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub articles: Vec<Article>,
    pub page: u32,
    pub has_more: bool,
    /// First-page load in progress.
    pub loading: bool,
    /// Follow-up page load in progress.
    pub loading_more: bool,
    pub error: Option<String>,
    pub refreshing: bool,
    /// Bumped whenever `articles` is replaced or extended.
    pub version: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            articles: Vec::new(),
            page: 1,
            has_more: true,
            loading: false,
            loading_more: false,
            error: None,
            refreshing: false,
            version: 0,
        }
    }
}

impl FeedState {
    pub fn is_busy(&self) -> bool {
        self.loading || self.loading_more
    }

    fn reset(&mut self) {
        self.articles.clear();
        self.page = 1;
        self.has_more = true;
        self.error = None;
        self.version += 1;
    }

    fn begin(&mut self, page: u32) {
        if page == 1 {
            self.loading = true;
        } else {
            self.loading_more = true;
        }
        self.error = None;
    }

    fn commit(&mut self, page: u32, articles: Vec<Article>, replace: bool, max_pages: u32) {
        if replace {
            self.articles = articles;
        } else {
            self.articles.extend(articles);
        }
        self.page = page;
        if page >= max_pages {
            self.has_more = false;
        }
        self.settle();
        self.version += 1;
    }

    fn fail(&mut self) {
        self.error = Some(FEED_ERROR_MESSAGE.to_string());
        self.settle();
    }

    fn settle(&mut self) {
        self.loading = false;
        self.loading_more = false;
        self.refreshing = false;
    }
}

/// How a `load` call ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Served from the response cache without touching the source.
    Cached,
    Fetched,
    /// A newer request or `close()` took over; nothing was committed.
    Superseded,
    /// `load_more` had nothing to do.
    Skipped,
}

fn state_channel() -> watch::Sender<FeedState> {
    let (tx, _rx) = watch::channel(FeedState::default());
    tx
}
