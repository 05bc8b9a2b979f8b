//! Transactional store for tasks and trash entries
//!
//! All mutations go through [`TaskStore::transaction`]: the closure runs
//! against a working copy of the state while the write lock is held, the copy
//! is persisted, and only then does it replace the live state. An error at any
//! point discards the copy, so callers never observe half-applied changes.

mod backend;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use state::{StoreSnapshot, StoreState};

use crate::clock::{Clock, SystemClock};
use crate::Result;

pub struct TaskStore {
    state: RwLock<StoreState>,
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
}

impl TaskStore {
    /// Load the current state from `backend`.
    pub async fn open(backend: Arc<dyn StorageBackend>, clock: Arc<dyn Clock>) -> Result<Self> {
        let snapshot = backend.load().await?;
        tracing::debug!(
            tasks = snapshot.tasks.len(),
            trash_entries = snapshot.trash.len(),
            "Loaded task store"
        );
        Ok(Self {
            state: RwLock::new(snapshot.into()),
            backend,
            clock,
        })
    }

    /// Open a JSON-file store at `path` using wall-clock time.
    pub async fn file(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(Arc::new(FileBackend::new(path)), Arc::new(SystemClock)).await
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run `f` against a consistent view of the state.
    pub async fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        let state = self.state.read().await;
        f(&state)
    }

    /// Run `f` as one atomic unit of work.
    ///
    /// Transactions are serialized with each other; reads see either the
    /// state before or after a transaction, never in between.
    pub async fn transaction<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T>,
    ) -> Result<T> {
        let mut live = self.state.write().await;
        let mut working = live.clone();
        let out = f(&mut working)?;

        if let Err(err) = self.backend.save(&StoreSnapshot::from(&working)).await {
            tracing::error!(error = %err, "Failed to persist transaction, rolling back");
            return Err(err);
        }

        *live = working;
        Ok(out)
    }
}
