use thiserror::Error;

/// Message shown to the reader when a feed page cannot be loaded.
pub const FEED_ERROR_MESSAGE: &str = "Error al cargar las noticias. Inténtalo de nuevo.";

#[derive(Debug, Error)]
pub enum FeedError {
    /// The request was superseded or the feed was closed. Never shown to the user.
    #[error("request cancelled")]
    Cancelled,
    #[error("article source failed: {0}")]
    Source(String),
    #[error("page numbers start at 1, got {0}")]
    InvalidPage(u32),
}

impl FeedError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FeedError::Cancelled)
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("cannot {action} while worker is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    #[error("no cached response for {0}")]
    NoCachedResponse(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to locate the configuration directory")]
    NoConfigDir,
}
