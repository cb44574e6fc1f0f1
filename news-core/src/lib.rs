pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod favorites;
pub mod gestures;
pub mod models;
pub mod persist;
pub mod prefetch;
pub mod preferences;
pub mod request;
pub mod source;
pub mod worker;

pub use cache::{CachePage, ResponseCache};
pub use config::{AppConfig, FeedConfig, StorageConfig, WorkerConfig};
pub use engine::{CategoryFeed, FeedState, LoadOutcome, PersonalizedFeed};
pub use error::{ConfigError, FeedError, StoreError, WorkerError, FEED_ERROR_MESSAGE};
pub use favorites::{FavoriteItem, FavoritesStore};
pub use gestures::{InfiniteScroll, PullToRefresh};
pub use models::{Article, Category, CategoryFilter, Outlet};
pub use prefetch::PrefetchScheduler;
pub use preferences::{PreferencesStore, UserPreferences};
pub use request::{CancellationToken, RequestController, RequestHandle};
pub use source::{ArticleSource, FeedQuery, PageRequest, SimulatedSource};
pub use worker::{OfflineWorker, WorkerState};
