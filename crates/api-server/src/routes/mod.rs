//! Route handlers

pub mod audit;
pub mod error;
pub mod health;
pub mod task;
pub mod trash;

use uuid::Uuid;

use crate::audit::AuditEvent;
use crate::state::AppState;
use error::{too_many_requests, RouteError};

/// Count one bulk request against the caller's rate limit.
pub(crate) async fn check_bulk_limit(state: &AppState, user_id: Uuid) -> Result<(), RouteError> {
    state.bulk_limiter().check(user_id).await.map_err(|retry_after| {
        tracing::warn!(%user_id, "Bulk operation rate limited");
        too_many_requests(retry_after)
    })
}

/// Append to the audit log. A failed append is logged, the request still succeeds.
pub(crate) async fn record_audit(state: &AppState, event: AuditEvent) {
    let action = event.action.as_str();
    if let Err(err) = state.audit_store().append(event).await {
        tracing::error!("Failed to record audit event {}: {}", action, err);
    }
}
