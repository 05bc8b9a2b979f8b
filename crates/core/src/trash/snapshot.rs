//! Serialized task snapshots stored in trash entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::{Task, TaskPriority};
use crate::{Error, Result};

/// The fields of a task as they were when it was deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            user_id: task.user_id,
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            category: task.category.clone(),
            due_date: task.due_date,
            is_completed: task.is_completed,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

impl TaskSnapshot {
    /// Serialize `task`, refusing anything longer than `max_chars`.
    /// Oversized snapshots are never truncated.
    pub fn encode(task: &Task, max_chars: usize) -> Result<String> {
        let encoded = serde_json::to_string(&Self::from(task))?;
        let len = encoded.chars().count();
        if len > max_chars {
            return Err(Error::SnapshotTooLarge {
                task_id: task.id,
                len,
                limit: max_chars,
            });
        }
        Ok(encoded)
    }

    pub fn decode(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}
