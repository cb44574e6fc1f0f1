//! JSON files written atomically (temp file + rename), read back with a
//! fallback to the temp file when the main file is corrupted.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::error::StoreError;

fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Reads `path`, then `path.json.tmp`, then gives up. `None` means neither
/// file held valid JSON.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to read store");
            return None;
        }
    };
    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to parse JSON, trying tmp fallback");
            let tmp = tmp_path(path);
            let tmp_bytes = tokio::fs::read(&tmp).await.ok()?;
            serde_json::from_slice::<T>(&tmp_bytes).ok()
        }
    }
}

pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
