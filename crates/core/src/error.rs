//! Error types for the core library

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Tasks not found or not owned by caller: {}", join_ids(.0))]
    OwnershipViolation(Vec<Uuid>),

    #[error("Tasks are not in the trash: {}", join_ids(.0))]
    InvalidRestoreTarget(Vec<Uuid>),

    #[error("Snapshot of task {task_id} is {len} chars, limit is {limit}")]
    SnapshotTooLarge {
        task_id: Uuid,
        len: usize,
        limit: usize,
    },

    #[error("Store temporarily unavailable: {0}")]
    TransientStoreFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::TransientStoreFailure(_) | Self::Io(_))
    }

    /// Ids named by a validation failure, if any.
    pub fn offending_ids(&self) -> &[Uuid] {
        match self {
            Self::OwnershipViolation(ids) | Self::InvalidRestoreTarget(ids) => ids,
            _ => &[],
        }
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
