//! Purge engine
//!
//! Permanently removes tasks whose trash entries have outlived retention.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::model::{PurgeResult, TrashEntry};
use crate::store::StoreState;

/// Which trash entries a purge pass selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeCriteria {
    pub user_id: Option<Uuid>,
    pub cutoff: Cutoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cutoff {
    /// `scheduled_purge_at` has passed
    Scheduled { now: DateTime<Utc> },
    /// Deleted before the given instant
    DeletedBefore(DateTime<Utc>),
}

impl PurgeCriteria {
    pub fn new(user_id: Option<Uuid>, override_days: Option<u32>, now: DateTime<Utc>) -> Self {
        let cutoff = match override_days {
            // A cutoff before the representable range selects nothing.
            Some(days) => Cutoff::DeletedBefore(
                now.checked_sub_signed(Duration::days(i64::from(days)))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
            None => Cutoff::Scheduled { now },
        };
        Self { user_id, cutoff }
    }

    pub fn selects(&self, entry: &TrashEntry) -> bool {
        if !entry.is_active() {
            return false;
        }
        if let Some(user_id) = self.user_id {
            if entry.user_id != user_id {
                return false;
            }
        }
        match self.cutoff {
            Cutoff::Scheduled { now } => entry.scheduled_purge_at < now,
            Cutoff::DeletedBefore(before) => entry.deleted_at < before,
        }
    }
}

pub(crate) fn purge_expired(state: &mut StoreState, criteria: &PurgeCriteria) -> PurgeResult {
    let mut due: Vec<TrashEntry> = state
        .trash_entries()
        .filter(|entry| criteria.selects(entry))
        .cloned()
        .collect();
    due.sort_by(|a, b| a.deleted_at.cmp(&b.deleted_at));

    let mut result = PurgeResult::default();
    for entry in due {
        match state.task(entry.task_id) {
            None => {
                tracing::warn!(entry_id = %entry.id, task_id = %entry.task_id, "Removing orphaned trash entry");
                state.remove_trash_entry(entry.id);
                result.orphaned_count += 1;
            }
            Some(task) if task.user_id != entry.user_id || task.is_active() => {
                tracing::warn!(
                    entry_id = %entry.id,
                    task_id = %entry.task_id,
                    task_active = task.is_active(),
                    "Trash entry disagrees with its task, skipping purge"
                );
                result.skipped_entry_ids.push(entry.id);
            }
            Some(_) => {
                state.remove_task(entry.task_id);
                state.remove_trash_entry(entry.id);
                result.purged_count += 1;
            }
        }
    }

    result
}
