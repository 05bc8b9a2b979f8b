//! Task model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const TITLE_MAX_CHARS: usize = 255;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const CATEGORY_MAX_CHARS: usize = 100;

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

/// Where a task is in its deletion lifecycle.
///
/// This is the only place deletion is recorded; `soft_deleted` and
/// `deleted_at` seen by API clients are both projections of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted { at: DateTime<Utc> },
}

/// A task owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
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
    #[serde(default)]
    lifecycle: Lifecycle,
}

impl Task {
    /// Create a new active task for `user_id`
    pub fn new(user_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            priority: TaskPriority::default(),
            category: None,
            due_date: None,
            is_completed: false,
            created_at: now,
            updated_at: now,
            lifecycle: Lifecycle::Active,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn is_soft_deleted(&self) -> bool {
        !self.is_active()
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self.lifecycle {
            Lifecycle::Active => None,
            Lifecycle::Deleted { at } => Some(at),
        }
    }

    pub(crate) fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.lifecycle = Lifecycle::Deleted { at };
        self.updated_at = at;
    }

    pub(crate) fn mark_active(&mut self, at: DateTime<Utc>) {
        self.lifecycle = Lifecycle::Active;
        self.updated_at = at;
    }
}

/// Fields accepted when creating a task
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
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

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_optional("description", self.description.as_deref(), DESCRIPTION_MAX_CHARS)?;
        validate_optional("category", self.category.as_deref(), CATEGORY_MAX_CHARS)
    }

    pub(crate) fn into_task(self, user_id: Uuid, now: DateTime<Utc>) -> Task {
        let mut task = Task::new(user_id, self.title.trim());
        task.description = self.description;
        task.priority = self.priority.unwrap_or_default();
        task.category = self.category;
        task.due_date = self.due_date;
        task.is_completed = self.is_completed;
        task.created_at = now;
        task.updated_at = now;
        task
    }
}

/// Partial update of an active task
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
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

impl TaskUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = self.title.as_deref() {
            validate_title(title)?;
        }
        validate_optional("description", self.description.as_deref(), DESCRIPTION_MAX_CHARS)?;
        validate_optional("category", self.category.as_deref(), CATEGORY_MAX_CHARS)
    }

    pub(crate) fn apply(self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = Some(category);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(is_completed) = self.is_completed {
            task.is_completed = is_completed;
        }
        task.updated_at = now;
    }
}

/// A single field change applied to every task of a bulk update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkUpdate {
    Status(bool),
    Category(Option<String>),
    Priority(TaskPriority),
}

impl BulkUpdate {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Category(category) => {
                validate_optional("category", category.as_deref(), CATEGORY_MAX_CHARS)
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn apply(&self, task: &mut Task, now: DateTime<Utc>) {
        match self {
            Self::Status(is_completed) => task.is_completed = *is_completed,
            Self::Category(category) => task.category = category.clone(),
            Self::Priority(priority) => task.priority = *priority,
        }
        task.updated_at = now;
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Category(_) => "category",
            Self::Priority(_) => "priority",
        }
    }
}

/// Query over a user's active tasks
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub priority: Option<TaskPriority>,
    pub category: Option<String>,
    pub is_completed: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(category) = self.category.as_deref() {
            if task.category.as_deref() != Some(category) {
                return false;
            }
        }
        if let Some(is_completed) = self.is_completed {
            if task.is_completed != is_completed {
                return false;
            }
        }
        true
    }
}

/// One page of tasks plus the unpaginated total
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub total: usize,
}

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

pub fn page_bounds(limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
    (
        limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        offset.unwrap_or(0),
    )
}

fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Title cannot be empty".to_string()));
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(Error::InvalidInput(format!(
            "Title cannot exceed {} characters",
            TITLE_MAX_CHARS
        )));
    }
    Ok(())
}

fn validate_optional(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(value) if value.chars().count() > max => Err(Error::InvalidInput(format!(
            "{} cannot exceed {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}
