//! Soft-delete engine
//!
//! Flags tasks as deleted and files a snapshot of each into the trash bin.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::{BatchResult, TrashEntry, TrashPolicy};
use super::snapshot::TaskSnapshot;
use super::validate::{partition, Eligibility};
use crate::store::StoreState;
use crate::{Error, Result};

/// Soft-delete every task in `ids` or none of them.
///
/// Runs inside a store transaction. Tasks that are missing, foreign, or
/// already deleted fail the whole batch with `OwnershipViolation`.
pub(crate) fn soft_delete_batch(
    state: &mut StoreState,
    ids: &BTreeSet<Uuid>,
    user_id: Uuid,
    now: DateTime<Utc>,
    policy: &TrashPolicy,
) -> Result<BatchResult> {
    let verdict = partition(state, ids, user_id, Eligibility::Active);
    if !verdict.is_clean() {
        return Err(Error::OwnershipViolation(verdict.rejected()));
    }

    let mut result = BatchResult {
        requested: ids.len(),
        ..BatchResult::default()
    };

    for task_id in verdict.eligible {
        let entry = {
            let Some(task) = state.task_mut(task_id) else {
                result.failed_count += 1;
                continue;
            };
            let data = TaskSnapshot::encode(task, policy.snapshot_max_chars)?;
            task.mark_deleted(now);
            TrashEntry::new(task.id, task.user_id, now, policy.retention, data)
        };

        result.trash_entry_ids.push(entry.id);
        state.insert_trash_entry(entry)?;
        result.updated_count += 1;
    }

    Ok(result)
}
