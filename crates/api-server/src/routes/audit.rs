//! Audit log of the caller's bulk operations

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};

use super::error::{current_user, RouteError};
use crate::audit::{AuditListQuery, AuditListResponse};
use crate::state::AppState;

async fn list_audit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditListQuery>,
) -> Result<Json<AuditListResponse>, RouteError> {
    let user_id = current_user(&state, &headers)?;
    let (items, has_more) = state.audit_store().list_paginated(user_id, &query).await;
    let offset = query.offset.unwrap_or(0);
    let next_offset = if has_more {
        Some(offset + items.len())
    } else {
        None
    };

    Ok(Json(AuditListResponse {
        items,
        has_more,
        next_offset,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/audit", get(list_audit))
}
