//! Task API endpoints
//!
//! RESTful API for a user's active tasks, plus the bulk operations.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use tb_core::task::{BulkUpdate, NewTask, Task, TaskFilter, TaskPriority, TaskRepository, TaskUpdate};
use tb_core::trash::BatchResult;
use tb_core::Error;

use super::error::{bad_request, current_user, map_core_error, not_found, RouteError};
use super::{check_bulk_limit, record_audit};
use crate::audit::{AuditAction, AuditEvent};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(req: CreateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            priority: req.priority,
            category: req.category,
            due_date: req.due_date,
            is_completed: req.is_completed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

impl From<UpdateTaskRequest> for TaskUpdate {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            priority: req.priority,
            category: req.category,
            due_date: req.due_date,
            is_completed: req.is_completed,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub task_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkOperation {
    Status,
    Category,
    Priority,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateRequest {
    pub task_ids: Vec<Uuid>,
    pub operation: BulkOperation,
    #[serde(default)]
    pub value: Value,
}

impl BulkUpdateRequest {
    fn update(&self) -> Result<BulkUpdate, RouteError> {
        match self.operation {
            BulkOperation::Status => self
                .value
                .as_bool()
                .map(BulkUpdate::Status)
                .ok_or_else(|| bad_request("Status value must be a boolean")),
            BulkOperation::Category => match &self.value {
                Value::Null => Ok(BulkUpdate::Category(None)),
                Value::String(category) => Ok(BulkUpdate::Category(Some(category.clone()))),
                _ => Err(bad_request("Category value must be a string or null")),
            },
            BulkOperation::Priority => serde_json::from_value::<TaskPriority>(self.value.clone())
                .map(BulkUpdate::Priority)
                .map_err(|_| bad_request("Priority value must be one of low, medium, high")),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub category: Option<String>,
    pub due_date: Option<String>,
    pub is_completed: bool,
    pub soft_deleted: bool,
    pub deleted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            soft_deleted: task.is_soft_deleted(),
            deleted_at: task.deleted_at().map(|t| t.to_rfc3339()),
            title: task.title,
            description: task.description,
            priority: task.priority,
            category: task.category,
            due_date: task.due_date.map(|t| t.to_rfc3339()),
            is_completed: task.is_completed,
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks - List the caller's active tasks
async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<TaskListResponse>, RouteError> {
    let user_id = current_user(&state, &headers)?;
    let filter = TaskFilter {
        priority: query.priority,
        category: query.category,
        is_completed: query.is_completed,
        limit: query.limit,
        offset: query.offset,
    };

    let page = state
        .task_store()
        .list_tasks(user_id, &filter)
        .await
        .map_err(map_core_error)?;

    Ok(Json(TaskListResponse {
        tasks: page.tasks.into_iter().map(TaskResponse::from).collect(),
        total: page.total,
    }))
}

/// POST /api/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), RouteError> {
    let user_id = current_user(&state, &headers)?;

    let created = state
        .task_store()
        .create_task(user_id, req.into())
        .await
        .map_err(map_core_error)?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(created))))
}

/// GET /api/tasks/:id - Get a single active task
async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskResponse>, RouteError> {
    let user_id = current_user(&state, &headers)?;

    let task = state
        .task_store()
        .get_task(user_id, id)
        .await
        .map_err(map_core_error)?;

    Ok(Json(TaskResponse::from(task)))
}

/// PATCH /api/tasks/:id - Update a task
async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, RouteError> {
    let user_id = current_user(&state, &headers)?;

    let updated = state
        .task_store()
        .update_task(user_id, id, req.into())
        .await
        .map_err(map_core_error)?;

    Ok(Json(TaskResponse::from(updated)))
}

/// PATCH /api/tasks/:id/toggle - Flip completion
async fn toggle_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskResponse>, RouteError> {
    let user_id = current_user(&state, &headers)?;

    let toggled = state
        .task_store()
        .toggle_task(user_id, id)
        .await
        .map_err(map_core_error)?;

    Ok(Json(TaskResponse::from(toggled)))
}

/// DELETE /api/tasks/:id - Move a task to the trash
async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, RouteError> {
    let user_id = current_user(&state, &headers)?;

    let result = state
        .trash()
        .soft_delete_batch(&[id], user_id)
        .await
        .map_err(|err| match err {
            Error::OwnershipViolation(_) => not_found(format!("Task {} not found", id)),
            other => map_core_error(other),
        })?;

    record_audit(
        &state,
        AuditEvent::new(user_id, AuditAction::TaskDelete, result.updated_count, vec![id]),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/tasks/bulk/delete - Move several tasks to the trash at once
async fn bulk_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BatchResult>, RouteError> {
    let user_id = current_user(&state, &headers)?;
    check_bulk_limit(&state, user_id).await?;

    let result = state
        .trash()
        .bulk_delete_tasks(user_id, &req.task_ids)
        .await
        .map_err(map_core_error)?;

    record_audit(
        &state,
        AuditEvent::new(
            user_id,
            AuditAction::BulkDelete,
            result.updated_count,
            req.task_ids,
        ),
    )
    .await;

    Ok(Json(result))
}

/// POST /api/tasks/bulk/update - Apply one change to several tasks
async fn bulk_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BulkUpdateRequest>,
) -> Result<Json<BatchResult>, RouteError> {
    let user_id = current_user(&state, &headers)?;
    let update = req.update()?;
    check_bulk_limit(&state, user_id).await?;

    let kind = update.kind();
    let result = state
        .task_store()
        .bulk_update_tasks(user_id, &req.task_ids, update)
        .await
        .map_err(map_core_error)?;

    record_audit(
        &state,
        AuditEvent::new(
            user_id,
            AuditAction::BulkUpdate,
            result.updated_count,
            req.task_ids,
        )
        .with_detail(kind),
    )
    .await;

    Ok(Json(result))
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/toggle", patch(toggle_task))
        .route("/api/tasks/bulk/delete", post(bulk_delete))
        .route("/api/tasks/bulk/update", post(bulk_update))
}
