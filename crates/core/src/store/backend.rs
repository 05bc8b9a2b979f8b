//! Persistence backends for the task store

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::state::StoreSnapshot;
use crate::{Error, Result};

/// Where a [`TaskStore`](super::TaskStore) keeps its records.
///
/// `save` receives the complete post-transaction state and either stores all
/// of it or fails; a failed save leaves the previously stored state intact.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn load(&self) -> Result<StoreSnapshot>;

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<()>;
}

/// JSON file on disk
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// If the file doesn't exist, it will be created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn load(&self) -> Result<StoreSnapshot> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(StoreSnapshot::default());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(StoreSnapshot::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let content = serde_json::to_string_pretty(snapshot)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::TransientStoreFailure(e.to_string()))?;
        }

        // Write then rename so readers never see a half-written file
        let temp = self.temp_path();
        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| Error::TransientStoreFailure(e.to_string()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| Error::TransientStoreFailure(e.to_string()))?;
        Ok(())
    }
}

/// Keeps the last saved snapshot in memory. Saves can be made to fail on
/// demand to exercise rollback.
#[derive(Default)]
pub struct MemoryBackend {
    saved: Mutex<StoreSnapshot>,
    failures_pending: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` saves fail with a transient error.
    pub fn fail_next_saves(&self, count: usize) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    pub fn saved(&self) -> StoreSnapshot {
        self.saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn load(&self) -> Result<StoreSnapshot> {
        Ok(self.saved())
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let should_fail = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(Error::TransientStoreFailure(
                "injected save failure".to_string(),
            ));
        }
        *self
            .saved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = snapshot.clone();
        Ok(())
    }
}
