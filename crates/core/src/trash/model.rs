//! Trash bin model definitions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::snapshot::TaskSnapshot;
use crate::task::TaskPriority;
use crate::Result;

/// Point-in-time copy of a soft-deleted task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub deleted_at: DateTime<Utc>,
    pub scheduled_purge_at: DateTime<Utc>,
    #[serde(default)]
    pub is_restored: bool,
    #[serde(default)]
    pub restored_at: Option<DateTime<Utc>>,
    pub original_task_data: String,
}

impl TrashEntry {
    pub fn new(
        task_id: Uuid,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
        retention: Duration,
        original_task_data: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            user_id,
            deleted_at,
            scheduled_purge_at: deleted_at
                .checked_add_signed(retention)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            is_restored: false,
            restored_at: None,
            original_task_data,
        }
    }

    /// Not yet restored, so still eligible for restore or purge.
    pub fn is_active(&self) -> bool {
        !self.is_restored
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.scheduled_purge_at < now
    }

    pub fn days_until_purge(&self, now: DateTime<Utc>) -> i64 {
        (self.scheduled_purge_at - now).num_days().max(0)
    }

    pub fn snapshot(&self) -> Result<TaskSnapshot> {
        TaskSnapshot::decode(&self.original_task_data)
    }

    pub(crate) fn mark_restored(&mut self, at: DateTime<Utc>) {
        self.is_restored = true;
        self.restored_at = Some(at);
    }
}

/// Retention and size bounds applied by the trash engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrashPolicy {
    pub retention: Duration,
    pub snapshot_max_chars: usize,
}

pub const DEFAULT_RETENTION_DAYS: i64 = 30;
pub const DEFAULT_SNAPSHOT_MAX_CHARS: usize = 5000;

impl Default for TrashPolicy {
    fn default() -> Self {
        Self {
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
            snapshot_max_chars: DEFAULT_SNAPSHOT_MAX_CHARS,
        }
    }
}

impl TrashPolicy {
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention = Duration::days(i64::from(days));
        self
    }

    pub fn with_snapshot_max_chars(mut self, max: usize) -> Self {
        self.snapshot_max_chars = max;
        self
    }
}

/// Aggregate outcome of a batch delete, restore or update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub requested: usize,
    pub updated_count: usize,
    pub failed_count: usize,
    pub trash_entry_ids: Vec<Uuid>,
}

impl BatchResult {
    pub fn success(&self) -> bool {
        self.failed_count == 0
    }
}

/// Outcome of a purge pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResult {
    pub purged_count: usize,
    pub orphaned_count: usize,
    pub skipped_entry_ids: Vec<Uuid>,
}

/// A trash entry as shown to its owner
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashItem {
    pub entry_id: Uuid,
    pub task_id: Uuid,
    pub title: String,
    pub priority: TaskPriority,
    pub category: Option<String>,
    pub deleted_at: DateTime<Utc>,
    pub scheduled_purge_at: DateTime<Utc>,
    pub days_until_purge: i64,
    pub task: TaskSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashPage {
    pub items: Vec<TrashItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
