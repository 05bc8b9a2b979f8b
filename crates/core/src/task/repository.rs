//! Task repository trait
//!
//! Defines the interface for operations on a user's active tasks.

use async_trait::async_trait;
use uuid::Uuid;

use super::model::{BulkUpdate, NewTask, Task, TaskFilter, TaskPage, TaskUpdate};
use crate::trash::BatchResult;
use crate::Result;

/// Repository interface for task CRUD operations.
///
/// Every method is scoped to `user_id`; tasks owned by someone else, or
/// sitting in the trash, behave as if they did not exist.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a new task
    async fn create_task(&self, user_id: Uuid, new_task: NewTask) -> Result<Task>;

    /// Get an active task by ID
    async fn get_task(&self, user_id: Uuid, id: Uuid) -> Result<Task>;

    /// List active tasks matching `filter`, newest first
    async fn list_tasks(&self, user_id: Uuid, filter: &TaskFilter) -> Result<TaskPage>;

    /// Apply a partial update
    async fn update_task(&self, user_id: Uuid, id: Uuid, update: TaskUpdate) -> Result<Task>;

    /// Flip the completion flag
    async fn toggle_task(&self, user_id: Uuid, id: Uuid) -> Result<Task>;

    /// Apply one field change to every task in `task_ids`, or to none
    async fn bulk_update_tasks(
        &self,
        user_id: Uuid,
        task_ids: &[Uuid],
        update: BulkUpdate,
    ) -> Result<BatchResult>;
}
