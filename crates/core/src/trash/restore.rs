//! Restore engine

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::BatchResult;
use super::validate::{partition, Eligibility};
use crate::store::StoreState;
use crate::{Error, Result};

/// Bring every task in `ids` back out of the trash, or none of them.
///
/// Unknown or foreign ids fail with `OwnershipViolation`; owned tasks that
/// are not currently deleted fail with `InvalidRestoreTarget`. The matching
/// trash entry is marked restored and kept.
pub(crate) fn restore_batch(
    state: &mut StoreState,
    ids: &BTreeSet<Uuid>,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<BatchResult> {
    let verdict = partition(state, ids, user_id, Eligibility::Deleted);
    if !verdict.not_owned.is_empty() {
        return Err(Error::OwnershipViolation(verdict.not_owned));
    }
    if !verdict.wrong_state.is_empty() {
        return Err(Error::InvalidRestoreTarget(verdict.wrong_state));
    }

    let mut result = BatchResult {
        requested: ids.len(),
        ..BatchResult::default()
    };

    for task_id in verdict.eligible {
        let Some(task) = state.task_mut(task_id) else {
            result.failed_count += 1;
            continue;
        };
        task.mark_active(now);

        let active_entries = state.active_entries_for_task(task_id).count();
        if active_entries > 1 {
            tracing::warn!(
                %task_id,
                active_entries,
                "Task has more than one active trash entry, restoring the newest"
            );
        }
        match state.latest_active_entry_mut(task_id) {
            Some(entry) => {
                entry.mark_restored(now);
                result.trash_entry_ids.push(entry.id);
            }
            None => tracing::warn!(%task_id, "Restored task had no active trash entry"),
        }
        result.updated_count += 1;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::task::Task;
    use crate::trash::model::{TrashEntry, TrashPolicy};
    use crate::trash::soft_delete::soft_delete_batch;

    fn deleted_state(user: Uuid, tasks: &[Task]) -> StoreState {
        let mut state = StoreState::default();
        for task in tasks {
            state.insert_task(task.clone()).unwrap();
        }
        let ids: BTreeSet<Uuid> = tasks.iter().map(|t| t.id).collect();
        soft_delete_batch(&mut state, &ids, user, Utc::now(), &TrashPolicy::default()).unwrap();
        state
    }

    #[test]
    fn test_restore_reactivates_and_marks_entry() {
        let user = Uuid::new_v4();
        let task = Task::new(user, "a");
        let mut state = deleted_state(user, &[task.clone()]);
        let ids: BTreeSet<Uuid> = [task.id].into_iter().collect();
        let now = Utc::now();

        let result = restore_batch(&mut state, &ids, user, now).unwrap();
        assert_eq!(result.updated_count, 1);
        assert_eq!(result.trash_entry_ids.len(), 1);

        let restored = state.task(task.id).unwrap();
        assert!(restored.is_active());
        assert_eq!(restored.updated_at, now);

        let entries: Vec<_> = state.entries_for_task(task.id).collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_restored);
        assert_eq!(entries[0].restored_at, Some(now));
    }

    #[test]
    fn test_restore_active_task_is_invalid_target() {
        let user = Uuid::new_v4();
        let deleted = Task::new(user, "deleted");
        let active = Task::new(user, "active");
        let mut state = deleted_state(user, &[deleted.clone()]);
        state.insert_task(active.clone()).unwrap();
        let ids: BTreeSet<Uuid> = [deleted.id, active.id].into_iter().collect();

        let err = restore_batch(&mut state, &ids, user, Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidRestoreTarget(ref v) if v == &vec![active.id]));
        assert!(state.task(deleted.id).unwrap().is_soft_deleted());
    }

    #[test]
    fn test_restore_foreign_task_is_ownership_violation() {
        let owner = Uuid::new_v4();
        let task = Task::new(owner, "a");
        let mut state = deleted_state(owner, &[task.clone()]);
        let ids: BTreeSet<Uuid> = [task.id].into_iter().collect();

        let err = restore_batch(&mut state, &ids, Uuid::new_v4(), Utc::now()).unwrap_err();
        assert!(matches!(err, Error::OwnershipViolation(_)));
        assert!(state.task(task.id).unwrap().is_soft_deleted());
    }

    #[test]
    fn test_restore_only_touches_newest_active_entry() {
        let user = Uuid::new_v4();
        let task = Task::new(user, "a");
        let state = deleted_state(user, &[task.clone()]);

        // Forge an older active entry next to the real one
        let older = TrashEntry::new(
            task.id,
            user,
            Utc::now() - Duration::days(3),
            Duration::days(30),
            "{}".to_string(),
        );
        let older_id = older.id;
        let mut snapshot = crate::store::StoreSnapshot::from(&state);
        snapshot.trash.push(older);
        let mut state = StoreState::from(snapshot);

        let ids: BTreeSet<Uuid> = [task.id].into_iter().collect();
        restore_batch(&mut state, &ids, user, Utc::now()).unwrap();

        assert!(!state.trash_entry(older_id).unwrap().is_restored);
        assert_eq!(state.active_entries_for_task(task.id).count(), 1);
    }
}
