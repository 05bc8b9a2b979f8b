use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use super::{AuditEvent, AuditListQuery};

const DEFAULT_LIST_LIMIT: usize = 100;
const MAX_LIST_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to encode audit event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write audit log: {0}")]
    Io(#[from] std::io::Error),
}

/// Audit events kept in memory and mirrored to `events.jsonl`.
pub struct AuditStore {
    events_path: PathBuf,
    events: RwLock<Vec<AuditEvent>>,
}

fn action_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(str::to_lowercase)
}

impl AuditStore {
    pub async fn new(root_dir: PathBuf) -> std::io::Result<Self> {
        fs::create_dir_all(&root_dir).await?;
        let events_path = root_dir.join("events.jsonl");

        if fs::metadata(&events_path).await.is_err() {
            fs::File::create(&events_path).await?;
        }

        let events = Self::load_events(&events_path).await?;
        Ok(Self {
            events_path,
            events: RwLock::new(events),
        })
    }

    async fn load_events(path: &Path) -> std::io::Result<Vec<AuditEvent>> {
        let file = fs::File::open(path).await?;
        let mut reader = BufReader::new(file).lines();
        let mut events = Vec::new();

        while let Some(line) = reader.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<AuditEvent>(&line) {
                Ok(event) => events.push(event),
                Err(err) => warn!(
                    "Ignoring malformed audit event in {}: {}",
                    path.display(),
                    err
                ),
            }
        }

        Ok(events)
    }

    pub async fn append(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');

        // Hold the write lock across the file append so lines stay in order.
        let mut state = self.events.write().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        state.push(event);
        Ok(())
    }

    /// Events of `user_id`, latest first.
    pub async fn list_paginated(
        &self,
        user_id: Uuid,
        query: &AuditListQuery,
    ) -> (Vec<AuditEvent>, bool) {
        let offset = query.offset.unwrap_or(0);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        let action = action_filter(query.action.as_deref());

        let state = self.events.read().await;
        let mut matched = 0usize;
        let mut events = Vec::with_capacity(limit.min(state.len()));

        for event in state.iter().rev() {
            if event.user_id != user_id {
                continue;
            }

            if let Some(filter) = action.as_deref() {
                if !event.action.as_str().contains(filter) {
                    continue;
                }
            }

            if let Some(task_id) = query.task_id {
                if !event.task_ids.contains(&task_id) {
                    continue;
                }
            }

            if matched < offset {
                matched += 1;
                continue;
            }

            if events.len() < limit {
                events.push(event.clone());
            }
            matched += 1;
        }

        let has_more = matched > offset + events.len();
        (events, has_more)
    }
}
