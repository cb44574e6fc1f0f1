//! Installable cache worker.
//!
//! Sits between the application and the network: precaches the app shell on
//! install, drops stale cache generations on activation, and answers GET
//! requests with network-first (API) or stale-while-revalidate (assets).

mod http;
mod storage;
mod strategy;
mod transport;

pub use http::{Request, RequestMode, Response};
pub use storage::{CacheBucket, CacheStorage};
pub use strategy::{classify, is_api_request, Strategy};
pub use transport::{HttpTransport, Transport};

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::WorkerConfig;
use crate::error::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    Activated,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages the page can post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerMessage {
    SkipWaiting,
}

impl FromStr for WorkerMessage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skipWaiting" => Ok(WorkerMessage::SkipWaiting),
            other => Err(format!("unknown worker message: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<String>,
}

pub struct OfflineWorker {
    origin: Url,
    config: WorkerConfig,
    transport: Arc<dyn Transport>,
    caches: CacheStorage,
    state: watch::Sender<WorkerState>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
    background: Mutex<JoinSet<()>>,
}

impl OfflineWorker {
    pub fn new(
        origin: Url,
        config: WorkerConfig,
        transport: Arc<dyn Transport>,
        caches: CacheStorage,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Parsed);
        Self {
            origin,
            config,
            transport,
            caches,
            state,
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
            background: Mutex::new(JoinSet::new()),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    /// Precaches the shell manifest. Assets that fail are logged and skipped.
    pub async fn install(&self) -> Result<InstallReport, WorkerError> {
        self.transition(WorkerState::Parsed, WorkerState::Installing, "install")?;
        info!(cache = %self.config.cache_name, "installing worker");

        self.caches.open(&self.config.cache_name).await;

        let mut report = InstallReport::default();
        let mut requests = Vec::with_capacity(self.config.precache.len());
        for path in &self.config.precache {
            match self.origin.join(path) {
                Ok(url) => requests.push(Request::get(url)),
                Err(e) => {
                    warn!(path, error = %e, "invalid precache path");
                    report.failed.push(path.clone());
                }
            }
        }

        let fetched = join_all(requests.iter().map(|r| self.transport.fetch(r))).await;
        for (request, result) in requests.iter().zip(fetched) {
            let path = request.url.path().to_string();
            match result {
                Ok(response) if response.is_ok() => {
                    self.caches
                        .put(&self.config.cache_name, request, response)
                        .await;
                    report.cached.push(path);
                }
                Ok(response) => {
                    warn!(
                        url = %request.url,
                        status = response.status,
                        "precache got error status"
                    );
                    report.failed.push(path);
                }
                Err(e) => {
                    warn!(url = %request.url, error = %e, "precache failed");
                    report.failed.push(path);
                }
            }
        }

        self.state.send_replace(WorkerState::Installed);
        if self.config.skip_waiting_on_install {
            self.skip_waiting.store(true, Ordering::SeqCst);
        }
        if self.skip_waiting.load(Ordering::SeqCst) {
            self.activate().await?;
        }
        Ok(report)
    }

    /// Deletes every cache bucket but the current one, then claims clients.
    /// Returns the names of the dropped buckets.
    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        self.transition(WorkerState::Installed, WorkerState::Activating, "activate")?;
        info!("activating worker");

        let mut dropped = Vec::new();
        for name in self.caches.keys().await {
            if name != self.config.cache_name {
                info!(cache = %name, "deleting old cache");
                self.caches.delete(&name).await;
                dropped.push(name);
            }
        }

        self.clients_claimed.store(true, Ordering::SeqCst);
        self.state.send_replace(WorkerState::Activated);
        info!("worker active, clients claimed");
        Ok(dropped)
    }

    /// Activates a waiting worker now, or as soon as installation finishes.
    pub async fn skip_waiting(&self) -> Result<(), WorkerError> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        if self.state() == WorkerState::Installed {
            self.activate().await?;
        }
        Ok(())
    }

    pub async fn handle_message(&self, message: &str) -> Result<(), WorkerError> {
        match message.parse::<WorkerMessage>() {
            Ok(WorkerMessage::SkipWaiting) => self.skip_waiting().await,
            Err(e) => {
                debug!(error = %e, "ignoring message");
                Ok(())
            }
        }
    }

    /// Answers a request the way the page would see it through the worker.
    pub async fn fetch(&self, request: Request) -> Result<Response, WorkerError> {
        if self.state() != WorkerState::Activated {
            return self.transport.fetch(&request).await;
        }
        match classify(&request, &self.config) {
            None => self.transport.fetch(&request).await,
            Some(Strategy::NetworkFirst) => self.network_first(request).await,
            Some(Strategy::StaleWhileRevalidate) => self.stale_while_revalidate(request).await,
        }
    }

    /// Background revalidations not yet reaped.
    pub fn pending_revalidations(&self) -> usize {
        self.background
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Waits for background revalidations spawned so far.
    pub async fn wait_until_idle(&self) {
        let mut pending = {
            let mut background = self
                .background
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *background)
        };
        while pending.join_next().await.is_some() {}
    }

    async fn network_first(&self, request: Request) -> Result<Response, WorkerError> {
        match self.transport.fetch(&request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.caches
                        .put(&self.config.cache_name, &request, response.clone())
                        .await;
                }
                Ok(response)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "network failed, trying cache");
                match self.caches.match_any(&request).await {
                    Some(cached) => {
                        info!(url = %request.url, "serving cached API response");
                        Ok(cached)
                    }
                    None => Ok(Response::offline()),
                }
            }
        }
    }

    async fn stale_while_revalidate(&self, request: Request) -> Result<Response, WorkerError> {
        if let Some(cached) = self.caches.match_any(&request).await {
            self.revalidate(request);
            return Ok(cached);
        }

        match self.transport.fetch(&request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.caches
                        .put(&self.config.cache_name, &request, response.clone())
                        .await;
                }
                Ok(response)
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "fetch failed");
                if request.is_navigation() {
                    return self.offline_document().await;
                }
                Err(e)
            }
        }
    }

    async fn offline_document(&self) -> Result<Response, WorkerError> {
        let url = self
            .origin
            .join(&self.config.offline_document)
            .map_err(|e| WorkerError::Transport(e.to_string()))?;
        let document = Request::get(url);
        self.caches
            .match_any(&document)
            .await
            .ok_or_else(|| WorkerError::NoCachedResponse(document.url.to_string()))
    }

    fn revalidate(&self, request: Request) {
        let transport = Arc::clone(&self.transport);
        let caches = self.caches.clone();
        let bucket = self.config.cache_name.clone();
        let mut background = self
            .background
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Reap finished revalidations so the set only holds live tasks.
        while background.try_join_next().is_some() {}
        background.spawn(async move {
            match transport.fetch(&request).await {
                Ok(response) if response.is_ok() => {
                    caches.put(&bucket, &request, response).await;
                    debug!(url = %request.url, "revalidated cached asset");
                }
                Ok(_) => {}
                Err(e) => debug!(url = %request.url, error = %e, "background revalidation failed"),
            }
        });
    }

    fn transition(
        &self,
        from: WorkerState,
        to: WorkerState,
        action: &'static str,
    ) -> Result<(), WorkerError> {
        let current = self.state();
        if current != from {
            return Err(WorkerError::InvalidState {
                action,
                state: current.as_str(),
            });
        }
        self.state.send_replace(to);
        Ok(())
    }
}
