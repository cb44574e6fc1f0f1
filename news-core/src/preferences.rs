use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::Category;
use crate::persist::{read_json, write_json};

/// Missing fields in a stored file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPreferences {
    pub interests: Vec<Category>,
    pub dark_mode: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            interests: vec![Category::General, Category::Technology, Category::Science],
            dark_mode: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreferencesStore {
    inner: Arc<RwLock<UserPreferences>>,
    path: Option<PathBuf>,
}

impl Default for PreferencesStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl PreferencesStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(UserPreferences::default())),
            path: None,
        }
    }

    pub async fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let prefs: UserPreferences = read_json(&path).await.unwrap_or_default();
        Self {
            inner: Arc::new(RwLock::new(prefs)),
            path: Some(path),
        }
    }

    pub async fn get(&self) -> UserPreferences {
        self.inner.read().await.clone()
    }

    pub async fn interests(&self) -> Vec<Category> {
        self.inner.read().await.interests.clone()
    }

    pub async fn has_interest(&self, category: Category) -> bool {
        self.inner.read().await.interests.contains(&category)
    }

    pub async fn set_interests(&self, interests: Vec<Category>) {
        self.inner.write().await.interests = interests;
        self.persist().await;
    }

    /// Returns whether the category is selected afterwards.
    pub async fn toggle_interest(&self, category: Category) -> bool {
        let mut prefs = self.inner.write().await;
        let selected = if prefs.interests.contains(&category) {
            prefs.interests.retain(|c| *c != category);
            false
        } else {
            prefs.interests.push(category);
            true
        };
        drop(prefs);
        self.persist().await;
        selected
    }

    pub async fn set_dark_mode(&self, dark_mode: bool) {
        self.inner.write().await.dark_mode = dark_mode;
        self.persist().await;
    }

    pub async fn reset(&self) {
        *self.inner.write().await = UserPreferences::default();
        self.persist().await;
    }

    async fn persist(&self) {
        let Some(path) = &self.path else {
            debug!("preferences are in-memory only; skipping persist");
            return;
        };
        let prefs = self.inner.read().await;
        if let Err(e) = write_json(path, &*prefs).await {
            warn!(error = %e, path = %path.display(), "failed to persist preferences");
        }
    }
}
