//! Trash bin operations exposed to callers
//!
//! Each operation resolves its ids, then runs one of the engines inside a
//! single store transaction.

use std::sync::Arc;

use uuid::Uuid;

use super::model::{BatchResult, PurgeResult, TrashItem, TrashPage, TrashPolicy};
use super::purge::{self, PurgeCriteria};
use super::restore;
use super::snapshot::TaskSnapshot;
use super::soft_delete;
use super::validate::requested_ids;
use crate::store::TaskStore;
use crate::task::page_bounds;
use crate::Result;

#[derive(Clone)]
pub struct TrashService {
    store: Arc<TaskStore>,
    policy: TrashPolicy,
}

impl TrashService {
    pub fn new(store: Arc<TaskStore>, policy: TrashPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &TrashPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub async fn soft_delete_batch(&self, task_ids: &[Uuid], user_id: Uuid) -> Result<BatchResult> {
        let ids = requested_ids(task_ids)?;
        let now = self.store.now();
        let policy = self.policy;

        let result = self
            .store
            .transaction(|state| soft_delete::soft_delete_batch(state, &ids, user_id, now, &policy))
            .await?;

        log_batch("soft_delete", user_id, &result);
        Ok(result)
    }

    pub async fn restore_batch(&self, task_ids: &[Uuid], user_id: Uuid) -> Result<BatchResult> {
        let ids = requested_ids(task_ids)?;
        let now = self.store.now();

        let result = self
            .store
            .transaction(|state| restore::restore_batch(state, &ids, user_id, now))
            .await?;

        log_batch("restore", user_id, &result);
        Ok(result)
    }

    /// Purge expired entries, optionally for one user, optionally with a
    /// shorter or longer retention than the one scheduled.
    pub async fn purge_expired(
        &self,
        user_id: Option<Uuid>,
        retention_override_days: Option<u32>,
    ) -> Result<PurgeResult> {
        let criteria = PurgeCriteria::new(user_id, retention_override_days, self.store.now());

        let result = self
            .store
            .transaction(|state| Ok(purge::purge_expired(state, &criteria)))
            .await?;

        if result.purged_count > 0 || result.orphaned_count > 0 {
            tracing::info!(
                user_id = ?user_id,
                purged = result.purged_count,
                orphaned = result.orphaned_count,
                skipped = result.skipped_entry_ids.len(),
                "Purged expired trash entries"
            );
        }
        Ok(result)
    }

    /// Active trash entries of `user_id`, newest first.
    pub async fn list_trash(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<TrashPage> {
        let (limit, offset) = page_bounds(limit, offset);
        let now = self.store.now();

        let (items, total) = self
            .store
            .read(|state| {
                // Entries whose snapshot and task are both gone cannot be shown
                // and are left out of the total as well.
                let mut resolved: Vec<_> = state
                    .trash_entries()
                    .filter(|e| e.user_id == user_id && e.is_active())
                    .filter_map(|entry| match entry.snapshot() {
                        Ok(snapshot) => Some((entry, snapshot)),
                        Err(err) => {
                            tracing::warn!(entry_id = %entry.id, error = %err, "Unreadable trash snapshot");
                            state
                                .task(entry.task_id)
                                .map(|task| (entry, TaskSnapshot::from(task)))
                        }
                    })
                    .collect();
                resolved.sort_by(|(a, _), (b, _)| {
                    b.deleted_at.cmp(&a.deleted_at).then(a.id.cmp(&b.id))
                });
                let total = resolved.len();

                let items: Vec<TrashItem> = resolved
                    .into_iter()
                    .skip(offset)
                    .take(limit)
                    .map(|(entry, snapshot)| TrashItem {
                        entry_id: entry.id,
                        task_id: entry.task_id,
                        title: snapshot.title.clone(),
                        priority: snapshot.priority,
                        category: snapshot.category.clone(),
                        deleted_at: entry.deleted_at,
                        scheduled_purge_at: entry.scheduled_purge_at,
                        days_until_purge: entry.days_until_purge(now),
                        task: snapshot,
                    })
                    .collect();
                (items, total)
            })
            .await;

        Ok(TrashPage {
            items,
            total,
            limit,
            offset,
        })
    }

    pub async fn restore_tasks(&self, user_id: Uuid, task_ids: &[Uuid]) -> Result<BatchResult> {
        self.restore_batch(task_ids, user_id).await
    }

    pub async fn bulk_delete_tasks(&self, user_id: Uuid, task_ids: &[Uuid]) -> Result<BatchResult> {
        self.soft_delete_batch(task_ids, user_id).await
    }

    /// Purge the caller's entries deleted more than `older_than_days` ago.
    pub async fn cleanup_trash(&self, user_id: Uuid, older_than_days: u32) -> Result<PurgeResult> {
        self.purge_expired(Some(user_id), Some(older_than_days)).await
    }
}

fn log_batch(operation: &str, user_id: Uuid, result: &BatchResult) {
    if result.failed_count > 0 {
        tracing::warn!(
            operation,
            %user_id,
            requested = result.requested,
            updated = result.updated_count,
            failed = result.failed_count,
            "Batch partially applied"
        );
    } else {
        tracing::info!(
            operation,
            %user_id,
            updated = result.updated_count,
            "Batch applied"
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use futures::future::join_all;

    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::store::MemoryBackend;
    use crate::task::{NewTask, Task, TaskRepository};
    use crate::trash::TrashEntry;
    use crate::Error;

    struct Harness {
        service: TrashService,
        clock: Arc<ManualClock>,
        backend: Arc<MemoryBackend>,
    }

    async fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let backend = Arc::new(MemoryBackend::new());
        let store = TaskStore::open(backend.clone(), clock.clone() as Arc<dyn Clock>)
            .await
            .unwrap();
        Harness {
            service: TrashService::new(Arc::new(store), TrashPolicy::default()),
            clock,
            backend,
        }
    }

    async fn create(h: &Harness, user: Uuid, title: &str) -> Task {
        h.service
            .store()
            .create_task(user, NewTask::titled(title))
            .await
            .unwrap()
    }

    async fn task(h: &Harness, id: Uuid) -> Option<Task> {
        h.service.store().read(|s| s.task(id).cloned()).await
    }

    async fn assert_invariants(h: &Harness) {
        h.service
            .store()
            .read(|s| {
                for task in s.tasks() {
                    assert_eq!(task.is_soft_deleted(), task.deleted_at().is_some());
                    assert!(s.active_entries_for_task(task.id).count() <= 1);
                }
            })
            .await;
    }

    #[tokio::test]
    async fn test_delete_restore_restore_again() {
        let h = harness().await;
        let user = Uuid::new_v4();
        let t1 = create(&h, user, "T1").await;
        let deleted_at = h.clock.now();

        let result = h.service.soft_delete_batch(&[t1.id], user).await.unwrap();
        assert_eq!(result.updated_count, 1);
        let e1 = result.trash_entry_ids[0];

        let stored = task(&h, t1.id).await.unwrap();
        assert!(stored.is_soft_deleted());
        let entry = h
            .service
            .store()
            .read(|s| s.trash_entry(e1).cloned())
            .await
            .unwrap();
        assert_eq!(entry.scheduled_purge_at, deleted_at + Duration::days(30));
        assert!(!entry.is_restored);

        let restored = h.service.restore_batch(&[t1.id], user).await.unwrap();
        assert_eq!(restored.updated_count, 1);
        assert_eq!(restored.trash_entry_ids, vec![e1]);
        assert!(!task(&h, t1.id).await.unwrap().is_soft_deleted());
        let entry = h
            .service
            .store()
            .read(|s| s.trash_entry(e1).cloned())
            .await
            .unwrap();
        assert!(entry.is_restored);

        let err = h.service.restore_batch(&[t1.id], user).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRestoreTarget(ref v) if v == &vec![t1.id]));
        assert_invariants(&h).await;
    }

    #[tokio::test]
    async fn test_restore_round_trip_preserves_fields() {
        let h = harness().await;
        let user = Uuid::new_v4();
        let mut new_task = NewTask::titled("Round trip");
        new_task.description = Some("keep me".to_string());
        new_task.category = Some("work".to_string());
        let original = h.service.store().create_task(user, new_task).await.unwrap();

        h.clock.advance(Duration::hours(1));
        h.service.soft_delete_batch(&[original.id], user).await.unwrap();
        h.clock.advance(Duration::hours(1));
        h.service.restore_batch(&[original.id], user).await.unwrap();

        let restored = task(&h, original.id).await.unwrap();
        assert_eq!(TaskSnapshot::from(&restored).title, original.title);
        assert_eq!(restored.description, original.description);
        assert_eq!(restored.category, original.category);
        assert_eq!(restored.priority, original.priority);
        assert_eq!(restored.created_at, original.created_at);
        assert!(restored.updated_at > original.updated_at);

        let entries = h
            .service
            .store()
            .read(|s| s.entries_for_task(original.id).cloned().collect::<Vec<_>>())
            .await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_restored);
        assert_eq!(entries[0].snapshot().unwrap(), TaskSnapshot::from(&original));
    }

    #[tokio::test]
    async fn test_purge_after_retention() {
        let h = harness().await;
        let user = Uuid::new_v4();
        let t2 = create(&h, user, "T2").await;
        h.service.soft_delete_batch(&[t2.id], user).await.unwrap();

        h.clock.advance(Duration::days(31));
        let result = h.service.purge_expired(Some(user), None).await.unwrap();
        assert_eq!(result.purged_count, 1);
        assert!(task(&h, t2.id).await.is_none());

        let page = h.service.list_trash(user, None, None).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());

        let again = h.service.purge_expired(Some(user), None).await.unwrap();
        assert_eq!(again.purged_count, 0);
    }

    #[tokio::test]
    async fn test_cross_user_batch_is_rejected_whole() {
        let h = harness().await;
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();
        let t3 = create(&h, u1, "T3").await;
        let t4 = create(&h, u2, "T4").await;

        let err = h
            .service
            .soft_delete_batch(&[t3.id, t4.id], u1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OwnershipViolation(ref v) if v == &vec![t4.id]));
        assert!(task(&h, t3.id).await.unwrap().is_active());
        assert!(task(&h, t4.id).await.unwrap().is_active());
        assert!(h.backend.saved().trash.is_empty());
    }

    #[tokio::test]
    async fn test_ownership_isolation() {
        let h = harness().await;
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let t = create(&h, owner, "private").await;
        h.service.soft_delete_batch(&[t.id], owner).await.unwrap();

        let err = h.service.restore_batch(&[t.id], intruder).await.unwrap_err();
        assert!(matches!(err, Error::OwnershipViolation(_)));

        let page = h.service.list_trash(intruder, None, None).await.unwrap();
        assert_eq!(page.total, 0);

        let purged = h.service.cleanup_trash(intruder, 0).await.unwrap();
        assert_eq!(purged.purged_count, 0);
        assert!(task(&h, t.id).await.unwrap().is_soft_deleted());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_no_partial_delete() {
        let h = harness().await;
        let user = Uuid::new_v4();
        let t = create(&h, user, "fragile").await;

        h.backend.fail_next_saves(1);
        let err = h.service.soft_delete_batch(&[t.id], user).await.unwrap_err();
        assert!(err.is_retriable());

        assert!(task(&h, t.id).await.unwrap().is_active());
        let entries = h
            .service
            .store()
            .read(|s| s.trash_entries().count())
            .await;
        assert_eq!(entries, 0);

        // Retry succeeds
        h.service.soft_delete_batch(&[t.id], user).await.unwrap();
        assert_invariants(&h).await;
    }

    #[tokio::test]
    async fn test_concurrent_deletes_create_one_entry() {
        let h = harness().await;
        let user = Uuid::new_v4();
        let t = create(&h, user, "contended").await;

        let ids = [t.id];
        let attempts = join_all((0..8).map(|_| h.service.soft_delete_batch(&ids, user))).await;
        let successes = attempts.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for failure in attempts.iter().filter_map(|r| r.as_ref().err()) {
            assert!(matches!(failure, Error::OwnershipViolation(_)));
        }

        let active = h
            .service
            .store()
            .read(|s| s.active_entries_for_task(t.id).count())
            .await;
        assert_eq!(active, 1);
    }

    #[tokio::test]
    async fn test_list_trash_pages_newest_first() {
        let h = harness().await;
        let user = Uuid::new_v4();
        let mut ids = Vec::new();
        for i in 0..3 {
            let t = create(&h, user, &format!("task {}", i)).await;
            h.service.soft_delete_batch(&[t.id], user).await.unwrap();
            h.clock.advance(Duration::minutes(1));
            ids.push(t.id);
        }

        let page = h.service.list_trash(user, Some(2), None).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].task_id, ids[2]);
        assert_eq!(page.items[1].task_id, ids[1]);
        assert_eq!(page.items[0].title, "task 2");

        let rest = h.service.list_trash(user, Some(2), Some(2)).await.unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.items[0].task_id, ids[0]);
    }

    #[tokio::test]
    async fn test_list_trash_pages_one_batch_without_gaps() {
        let h = harness().await;
        let user = Uuid::new_v4();
        let mut ids = Vec::new();
        for i in 0..30 {
            ids.push(create(&h, user, &format!("task {}", i)).await.id);
        }
        h.service.bulk_delete_tasks(user, &ids).await.unwrap();

        let first = h.service.list_trash(user, Some(20), None).await.unwrap();
        let again = h.service.list_trash(user, Some(20), None).await.unwrap();
        let second = h.service.list_trash(user, Some(20), Some(20)).await.unwrap();
        assert_eq!(first.total, 30);
        assert_eq!(second.items.len(), 10);

        let first_ids: Vec<Uuid> = first.items.iter().map(|i| i.entry_id).collect();
        let again_ids: Vec<Uuid> = again.items.iter().map(|i| i.entry_id).collect();
        assert_eq!(first_ids, again_ids);

        let mut seen: Vec<Uuid> = first
            .items
            .iter()
            .chain(second.items.iter())
            .map(|i| i.task_id)
            .collect();
        seen.sort();
        seen.dedup();
        ids.sort();
        assert_eq!(seen, ids);
    }

    #[tokio::test]
    async fn test_list_trash_total_skips_unrecoverable_entries() {
        let h = harness().await;
        let user = Uuid::new_v4();
        let kept = create(&h, user, "kept").await;
        h.service.soft_delete_batch(&[kept.id], user).await.unwrap();

        // Corrupt snapshot whose task no longer exists
        let broken = TrashEntry::new(
            Uuid::new_v4(),
            user,
            h.clock.now(),
            Duration::days(30),
            "not json".to_string(),
        );
        h.service
            .store()
            .transaction(|s| s.insert_trash_entry(broken))
            .await
            .unwrap();

        let page = h.service.list_trash(user, None, None).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].task_id, kept.id);
    }

    #[tokio::test]
    async fn test_oversized_snapshot_mid_batch_commits_nothing() {
        let h = harness().await;
        let user = Uuid::new_v4();

        // Ids fix the processing order so the oversized task comes last
        let mut small_a = Task::new(user, "small a");
        small_a.id = Uuid::from_u128(1);
        let mut small_b = Task::new(user, "small b");
        small_b.id = Uuid::from_u128(2);
        let mut big = Task::new(user, "big").with_description("d".repeat(6000));
        big.id = Uuid::from_u128(3);
        let tasks = [small_a, small_b, big];

        for t in tasks.iter().cloned() {
            h.service
                .store()
                .transaction(|s| s.insert_task(t))
                .await
                .unwrap();
        }
        let saved_before = h.backend.saved();

        let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let err = h.service.soft_delete_batch(&ids, user).await.unwrap_err();
        assert!(matches!(err, Error::SnapshotTooLarge { task_id, .. } if task_id == tasks[2].id));

        for t in &tasks {
            assert!(task(&h, t.id).await.unwrap().is_active());
        }
        let entries = h
            .service
            .store()
            .read(|s| s.trash_entries().count())
            .await;
        assert_eq!(entries, 0);
        assert_eq!(h.backend.saved(), saved_before);
        assert_invariants(&h).await;
    }

    #[tokio::test]
    async fn test_cleanup_with_unbounded_age_purges_nothing() {
        let h = harness().await;
        let user = Uuid::new_v4();
        let t = create(&h, user, "old").await;
        h.service.soft_delete_batch(&[t.id], user).await.unwrap();
        h.clock.advance(Duration::days(90));

        let result = h.service.cleanup_trash(user, u32::MAX).await.unwrap();
        assert_eq!(result, PurgeResult::default());
        assert!(task(&h, t.id).await.unwrap().is_soft_deleted());
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let h = harness().await;
        let err = h
            .service
            .soft_delete_batch(&[], Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
