use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "task.delete")]
    TaskDelete,
    #[serde(rename = "bulk.delete")]
    BulkDelete,
    #[serde(rename = "bulk.update")]
    BulkUpdate,
    #[serde(rename = "trash.restore")]
    TrashRestore,
    #[serde(rename = "trash.cleanup")]
    TrashCleanup,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskDelete => "task.delete",
            Self::BulkDelete => "bulk.delete",
            Self::BulkUpdate => "bulk.update",
            Self::TrashRestore => "trash.restore",
            Self::TrashCleanup => "trash.cleanup",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_id: Uuid,
    pub action: AuditAction,
    pub affected_count: usize,
    #[serde(default)]
    pub task_ids: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn new(
        user_id: Uuid,
        action: AuditAction,
        affected_count: usize,
        task_ids: Vec<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_id,
            action,
            affected_count,
            task_ids,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditListQuery {
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub task_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditListResponse {
    pub items: Vec<AuditEvent>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<usize>,
}
