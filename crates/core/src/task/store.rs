//! [`TaskRepository`] backed by the transactional [`TaskStore`]

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{page_bounds, BulkUpdate, NewTask, Task, TaskFilter, TaskPage, TaskUpdate};
use super::repository::TaskRepository;
use crate::store::{StoreState, TaskStore};
use crate::trash::{partition, requested_ids, BatchResult, Eligibility};
use crate::{Error, Result};

fn owned_active_mut(state: &mut StoreState, user_id: Uuid, id: Uuid) -> Result<&mut Task> {
    match state.task_mut(id) {
        Some(task) if task.user_id == user_id && task.is_active() => Ok(task),
        _ => Err(Error::TaskNotFound(id)),
    }
}

#[async_trait]
impl TaskRepository for TaskStore {
    async fn create_task(&self, user_id: Uuid, new_task: NewTask) -> Result<Task> {
        new_task.validate()?;
        let task = new_task.into_task(user_id, self.now());

        self.transaction(|state| {
            state.insert_task(task.clone())?;
            Ok(())
        })
        .await?;

        tracing::debug!(task_id = %task.id, %user_id, "Created task");
        Ok(task)
    }

    async fn get_task(&self, user_id: Uuid, id: Uuid) -> Result<Task> {
        self.read(|state| {
            state
                .task(id)
                .filter(|t| t.user_id == user_id && t.is_active())
                .cloned()
        })
        .await
        .ok_or(Error::TaskNotFound(id))
    }

    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> Result<TaskPage> {
        let (limit, offset) = page_bounds(filter.limit, filter.offset);

        let page = self
            .read(|state| {
                let mut tasks: Vec<&Task> = state
                    .tasks_for_user(user_id)
                    .filter(|t| t.is_active() && filter.matches(t))
                    .collect();
                // Newest first; id keeps equal timestamps in a stable order
                tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
                let total = tasks.len();
                TaskPage {
                    tasks: tasks.into_iter().skip(offset).take(limit).cloned().collect(),
                    total,
                }
            })
            .await;
        Ok(page)
    }

    async fn update_task(&self, user_id: Uuid, id: Uuid, update: TaskUpdate) -> Result<Task> {
        update.validate()?;
        let now = self.now();

        self.transaction(|state| {
            let task = owned_active_mut(state, user_id, id)?;
            update.apply(task, now);
            Ok(task.clone())
        })
        .await
    }

    async fn toggle_task(&self, user_id: Uuid, id: Uuid) -> Result<Task> {
        let now = self.now();

        self.transaction(|state| {
            let task = owned_active_mut(state, user_id, id)?;
            task.is_completed = !task.is_completed;
            task.updated_at = now;
            Ok(task.clone())
        })
        .await
    }

    async fn bulk_update_tasks(
        &self,
        user_id: Uuid,
        task_ids: &[Uuid],
        update: BulkUpdate,
    ) -> Result<BatchResult> {
        update.validate()?;
        let ids = requested_ids(task_ids)?;
        let now = self.now();

        let result = self
            .transaction(|state| {
                let verdict = partition(state, &ids, user_id, Eligibility::Active);
                if !verdict.is_clean() {
                    return Err(Error::OwnershipViolation(verdict.rejected()));
                }

                let mut result = BatchResult {
                    requested: ids.len(),
                    ..BatchResult::default()
                };
                for id in verdict.eligible {
                    match state.task_mut(id) {
                        Some(task) => {
                            update.apply(task, now);
                            result.updated_count += 1;
                        }
                        None => result.failed_count += 1,
                    }
                }
                Ok(result)
            })
            .await?;

        tracing::info!(
            %user_id,
            kind = update.kind(),
            updated = result.updated_count,
            "Bulk update applied"
        );
        Ok(result)
    }
}
