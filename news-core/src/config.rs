use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub worker: WorkerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub page_size: usize,
    pub max_pages: u32,
    pub category_latency_ms: u64,
    pub personalized_latency_ms: u64,
    pub cache_ttl_secs: u64,
    pub prefetch_enabled: bool,
    pub prefetch_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Current cache generation; any other bucket is dropped on activation.
    pub cache_name: String,
    pub precache: Vec<String>,
    pub api_path_marker: String,
    pub api_host_marker: String,
    pub offline_document: String,
    pub skip_waiting_on_install: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub max_favorites: usize,
    pub favorite_max_age_days: i64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            max_pages: 5,
            category_latency_ms: 800,
            personalized_latency_ms: 600,
            cache_ttl_secs: 5 * 60,
            prefetch_enabled: true,
            prefetch_delay_ms: 2000,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: "newspwa-v1".to_string(),
            precache: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/icons/icon-192x192.png".to_string(),
                "/icons/icon-512x512.png".to_string(),
            ],
            api_path_marker: "/api/".to_string(),
            api_host_marker: "newsapi".to_string(),
            offline_document: "/index.html".to_string(),
            skip_waiting_on_install: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_favorites: 100,
            favorite_max_age_days: 30,
        }
    }
}

impl FeedConfig {
    pub fn category_latency(&self) -> Duration {
        Duration::from_millis(self.category_latency_ms)
    }

    pub fn personalized_latency(&self) -> Duration {
        Duration::from_millis(self.personalized_latency_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn prefetch_delay(&self) -> Duration {
        Duration::from_millis(self.prefetch_delay_ms)
    }
}

impl AppConfig {
    /// `<config dir>/newsreader`, created on demand.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("newsreader");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Loads the user configuration, falling back to (and writing) defaults.
    pub fn load() -> Self {
        let path = match Self::config_file_path() {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "no config location, using defaults");
                return Self::default();
            }
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to load config, using defaults");
                let config = Self::default();
                if let Err(save_err) = config.save_to(&path) {
                    warn!(error = %save_err, "failed to write default config");
                }
                config
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
